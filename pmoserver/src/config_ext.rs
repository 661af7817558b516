use utoipa::OpenApi;

use crate::Server;

/// Monte l'API de `pmoconfig` sous `/api/config`
pub trait ConfigExt {
    async fn init_config_api(&mut self);
}

impl ConfigExt for Server {
    async fn init_config_api(&mut self) {
        let router = pmoconfig::api::create_router(pmoconfig::get_config());
        self.add_openapi(router, pmoconfig::ApiDoc::openapi(), "config")
            .await;
    }
}

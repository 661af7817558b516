use utoipa::OpenApi;

use crate::api::{ConfigEntry, ConfigError};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PMOStage Configuration",
        version = "0.1.0",
        description = "Consultation et modification de config.yaml"
    ),
    paths(
        crate::api::dump_config,
        crate::api::read_entry,
        crate::api::write_entry,
    ),
    components(schemas(ConfigEntry, ConfigError)),
    tags((name = "config", description = "Configuration du serveur"))
)]
pub struct ApiDoc;

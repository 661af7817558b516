//! Diffusion au mieux vers un pool de connexions
//!
//! L'envoi se fait dans la file non bornée de chaque connexion et ne
//! suspend jamais. Un envoi qui échoue signifie que la tâche de la connexion
//! est terminée : la connexion est évincée, une fois le parcours achevé.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::registry::{ConnectionId, ConnectionRegistry, Role};

/// Bilan d'une diffusion
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub evicted: Vec<ConnectionId>,
}

/// Sérialise un message une seule fois pour tous les destinataires
pub fn encode<T: Serialize>(message: &T) -> Option<Arc<str>> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            error!("Failed to encode outbound message: {}", e);
            None
        }
    }
}

/// Diffuse `message` à toutes les connexions du pool `role`
///
/// Un échec sur une connexion n'interrompt pas les autres envois.
pub fn broadcast<T: Serialize>(registry: &mut ConnectionRegistry, role: Role, message: &T) -> Delivery {
    let Some(payload) = encode(message) else {
        return Delivery::default();
    };

    let mut report = Delivery::default();
    for (id, outbound) in registry.members(role) {
        if outbound.send(payload.clone()).is_ok() {
            report.delivered += 1;
        } else {
            report.evicted.push(id);
        }
    }

    for id in &report.evicted {
        registry.leave(role, *id);
        warn!(connection = %id, role = %role, "Delivery failed, connection evicted");
    }

    debug!(role = %role, delivered = report.delivered, "Broadcast done");
    report
}

/// Envoie `message` à une seule connexion
///
/// Retourne `false` si la connexion est inconnue ou a dû être évincée.
pub fn send_to<T: Serialize>(
    registry: &mut ConnectionRegistry,
    role: Role,
    id: ConnectionId,
    message: &T,
) -> bool {
    let Some(outbound) = registry.outbound(role, id) else {
        return false;
    };
    let Some(payload) = encode(message) else {
        return false;
    };

    if outbound.send(payload).is_ok() {
        return true;
    }

    registry.leave(role, id);
    warn!(connection = %id, role = %role, "Delivery failed, connection evicted");
    false
}

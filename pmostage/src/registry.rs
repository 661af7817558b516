//! Registre des connexions ouvertes
//!
//! Deux pools disjoints, admin et display, indexés par [`ConnectionId`].
//! Chaque membre est représenté par l'émetteur de sa file sortante : le
//! registre ne connaît pas le transport.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// File sortante d'une connexion (messages déjà sérialisés)
pub type Outbound = mpsc::UnboundedSender<Arc<str>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Display,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Display => f.write_str("display"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    admins: HashMap<ConnectionId, Outbound>,
    displays: HashMap<ConnectionId, Outbound>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self, role: Role) -> &HashMap<ConnectionId, Outbound> {
        match role {
            Role::Admin => &self.admins,
            Role::Display => &self.displays,
        }
    }

    fn pool_mut(&mut self, role: Role) -> &mut HashMap<ConnectionId, Outbound> {
        match role {
            Role::Admin => &mut self.admins,
            Role::Display => &mut self.displays,
        }
    }

    /// Ajoute une connexion au pool
    ///
    /// Une connexion déjà présente n'est pas dupliquée : sa file est remplacée
    /// et la fonction retourne `false`.
    pub fn join(&mut self, role: Role, id: ConnectionId, outbound: Outbound) -> bool {
        self.pool_mut(role).insert(id, outbound).is_none()
    }

    /// Retire une connexion ; sans effet si elle est absente
    pub fn leave(&mut self, role: Role, id: ConnectionId) -> bool {
        self.pool_mut(role).remove(&id).is_some()
    }

    pub fn contains(&self, role: Role, id: ConnectionId) -> bool {
        self.pool(role).contains_key(&id)
    }

    pub fn len(&self, role: Role) -> usize {
        self.pool(role).len()
    }

    pub fn is_empty(&self, role: Role) -> bool {
        self.pool(role).is_empty()
    }

    pub fn outbound(&self, role: Role, id: ConnectionId) -> Option<&Outbound> {
        self.pool(role).get(&id)
    }

    /// Copie stable du pool, à parcourir pendant que le registre change
    pub fn members(&self, role: Role) -> Vec<(ConnectionId, Outbound)> {
        self.pool(role)
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }
}

//! Schema domain.

use std::ops::Deref;

use serde_json::json;

use crate::transport::{Transport, TypedReply};

use super::DomainController;
use super::types::DomainsResult;

/// Facade for the `Schema` domain.
#[derive(Debug, Clone)]
pub struct Schema {
    controller: DomainController,
}

impl Schema {
    /// Domain name on the wire.
    pub const DOMAIN: &'static str = "Schema";

    /// Creates a facade over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::from_controller(DomainController::new(transport, Self::DOMAIN))
    }

    pub(crate) fn from_controller(controller: DomainController) -> Self {
        Self { controller }
    }

    /// Lists the domains the peer supports.
    pub fn get_domains(&self) -> TypedReply<DomainsResult> {
        self.call("getDomains", json!({})).decode()
    }
}

impl Deref for Schema {
    type Target = DomainController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::TransportConfig;
    use crate::transport::testing::connected_pair;

    #[tokio::test]
    async fn test_get_domains() {
        let (transport, mut peer) = connected_pair(TransportConfig::default()).await;
        let schema = Schema::new(transport);

        let reply = schema.get_domains();
        let sent = peer.recv_json().await;
        assert_eq!(sent["method"], "Schema.getDomains");

        peer.send_json(json!({
            "id": sent["id"],
            "result": {"domains": [{"name": "Debugger", "version": "1.3"}]}
        }))
        .await;

        let result = reply.await.expect("domains");
        assert_eq!(result.domains.len(), 1);
        assert_eq!(result.domains[0].name, "Debugger");
    }
}

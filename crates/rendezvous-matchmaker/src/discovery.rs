//! Node discovery (spec §4.4): announce this node's address on a
//! cluster-wide set, and broadcast add/remove on a discovery channel.

use rendezvous_presence::Presence;
use rendezvous_protocol::{keys, Node};

pub async fn register_node(presence: &dyn Presence, node: &Node) -> Result<(), rendezvous_presence::PresenceError> {
    let formatted = node.to_string();
    presence.sadd(keys::NODES_SET, &formatted).await?;
    presence
        .publish(keys::NODES_DISCOVERY_CHANNEL, &keys::discovery_message(true, &formatted))
        .await?;
    tracing::info!(%node, "node registered");
    Ok(())
}

pub async fn unregister_node(presence: &dyn Presence, node: &Node) -> Result<(), rendezvous_presence::PresenceError> {
    let formatted = node.to_string();
    presence.srem(keys::NODES_SET, &formatted).await?;
    presence
        .publish(keys::NODES_DISCOVERY_CHANNEL, &keys::discovery_message(false, &formatted))
        .await?;
    tracing::info!(%node, "node unregistered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_presence::LocalPresence;
    use rendezvous_protocol::{NodeAddress, ProcessId};

    fn sample_node() -> Node {
        Node {
            process_id: ProcessId("p1".into()),
            address: NodeAddress { address: "10.0.0.1".into(), port: 2567 },
        }
    }

    #[tokio::test]
    async fn test_register_node_adds_to_set_and_publishes() {
        let presence = LocalPresence::new();
        let node = sample_node();
        let mut discovery = presence.subscribe(keys::NODES_DISCOVERY_CHANNEL).await.unwrap();

        register_node(&presence, &node).await.unwrap();

        let members = presence.smembers(keys::NODES_SET).await.unwrap();
        assert_eq!(members, vec![node.to_string()]);

        let message = discovery.recv().await.unwrap();
        assert_eq!(message, format!("add,{node}"));
    }

    #[tokio::test]
    async fn test_unregister_node_removes_from_set_and_publishes() {
        let presence = LocalPresence::new();
        let node = sample_node();
        register_node(&presence, &node).await.unwrap();

        let mut discovery = presence.subscribe(keys::NODES_DISCOVERY_CHANNEL).await.unwrap();
        unregister_node(&presence, &node).await.unwrap();

        assert!(presence.smembers(keys::NODES_SET).await.unwrap().is_empty());
        let message = discovery.recv().await.unwrap();
        assert_eq!(message, format!("remove,{node}"));
    }
}

//! Commands from the AR view to the rest of the app
//!
//! The view never reaches into other views. It sends [`ViewCommand`]s over a
//! bounded tokio channel handed in at open; sending never blocks and a full
//! or closed channel drops the command.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Requests the AR view makes of its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ViewCommand {
    /// Draw a walking route to the item on the map view
    ShowRoute { item_id: String },
    /// The user activated a hotspot
    OpenHotspot { item_id: String, hotspot_id: String },
    /// The anchor was placed
    Placed { item_id: String, position: Vec3 },
    /// The view closed
    Closed { item_id: String },
}

/// Sending half handed to the view
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<ViewCommand>,
}

/// Create a command channel with room for `capacity` pending commands
pub fn command_channel(capacity: usize) -> (CommandSender, mpsc::Receiver<ViewCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CommandSender { tx }, rx)
}

impl CommandSender {
    /// Fire and forget. Returns false if the command was dropped.
    pub fn send(&self, command: ViewCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(command)) => {
                tracing::warn!(?command, "Command channel full, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(command)) => {
                tracing::debug!(?command, "No command receiver");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let (tx, mut rx) = command_channel(4);
        assert!(tx.send(ViewCommand::ShowRoute {
            item_id: "castle".into()
        }));
        assert_eq!(
            rx.recv().await,
            Some(ViewCommand::ShowRoute {
                item_id: "castle".into()
            })
        );
    }

    #[test]
    fn test_full_or_closed_channel_drops() {
        let (tx, rx) = command_channel(1);
        assert!(tx.send(ViewCommand::Closed { item_id: "a".into() }));
        assert!(!tx.send(ViewCommand::Closed { item_id: "b".into() }));

        drop(rx);
        assert!(!tx.send(ViewCommand::Closed { item_id: "c".into() }));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(ViewCommand::OpenHotspot {
            item_id: "castle".into(),
            hotspot_id: "gate".into(),
        })
        .unwrap();
        assert_eq!(json["command"], "open_hotspot");
        assert_eq!(json["hotspot_id"], "gate");
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Sender half of the in-process domain event channel.
///
/// Services emit events strictly after their transaction commits; the
/// consumer loop in [`process_events`] must never feed back into a
/// transaction boundary.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing the caller when the
    /// receiver has gone away. State changes are already committed by the
    /// time events fire, so a dead consumer must not fail the operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping domain event: {}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Process lifecycle events
    ProcessCreated {
        process_id: Uuid,
        product: String,
        item_type: String,
        initial_stage: String,
    },
    StageAdvanced {
        process_id: Uuid,
        from_stage: String,
        to_stage: String,
    },
    ProcessRedirected {
        process_id: Uuid,
        from_stage: String,
        to_stage: String,
        failure_reason: String,
    },
    ProcessCompleted {
        process_id: Uuid,
        final_status: String,
        repaired: Option<bool>,
    },

    // Stage activity events
    StageAccepted {
        process_id: Uuid,
        activity_id: Uuid,
        employee_id: Uuid,
        stage: String,
    },
    StageStarted {
        process_id: Uuid,
        activity_id: Uuid,
        employee_id: Uuid,
        started_at: DateTime<Utc>,
    },

    // Raw material ledger events
    MaterialRequestCreated {
        request_id: Uuid,
        requested_by: Uuid,
        line_count: usize,
    },
    MaterialRequestApproved {
        request_id: Uuid,
        processed_by: Uuid,
    },
    MaterialRequestDeclined {
        request_id: Uuid,
        processed_by: Uuid,
    },
    MaterialsSanctioned {
        request_id: Uuid,
        employee_id: Uuid,
    },
    MaterialsConsumed {
        process_id: Uuid,
        employee_id: Uuid,
        total_quantity: Decimal,
    },

    // Disassembly recovery events
    DisassembleRecoverySubmitted {
        process_id: Uuid,
        disassembled_by: Uuid,
        received_by: Uuid,
        reclaimed_lines: usize,
    },

    // Warehouse side effects
    WarehouseStockIncremented {
        sub_item: String,
        counter: String,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

/// Consumes domain events and records them. Runs until the channel closes.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::ProcessCompleted {
                process_id,
                final_status,
                ..
            } => {
                info!(%process_id, %final_status, "Process completed");
            }
            Event::ProcessRedirected {
                process_id,
                to_stage,
                failure_reason,
                ..
            } => {
                info!(%process_id, %to_stage, %failure_reason, "Process redirected");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop terminated");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);

        // Must not panic or error out to the caller.
        sender
            .send_or_log(Event::WarehouseStockIncremented {
                sub_item: "PUMP 5HP DC".to_string(),
                counter: "quantity".to_string(),
            })
            .await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        let process_id = Uuid::new_v4();
        sender
            .send(Event::ProcessCreated {
                process_id,
                product: "SOLAR PUMP SET".to_string(),
                item_type: "SERVICE".to_string(),
                initial_stage: "Disassemble".to_string(),
            })
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            Event::ProcessCreated { process_id: id, .. } => assert_eq!(id, process_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

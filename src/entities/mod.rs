pub mod disassemble_recovery;
pub mod disassemble_recovery_line;
pub mod failure_redirect;
pub mod item_request;
pub mod item_request_line;
pub mod item_usage;
pub mod raw_material;
pub mod service_process;
pub mod stage_activity;
pub mod stage_flow;
pub mod user_item_stock;
pub mod warehouse_stock;

pub use service_process::{
    DisassembleStatus, FinalStatus, ItemType, ProcessStatus,
};
pub use stage_activity::ActivityStatus;

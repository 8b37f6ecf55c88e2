//! External sinks
//!
//! `ReleaseSink` receives finished tables (write-truncate); `TicketSink`
//! receives operator tickets. Both are collaborators: the pipeline only
//! decides what to send.

pub mod tickets;
pub mod warehouse;

pub use tickets::{
    file_tickets, plan_tickets, FiledTickets, OutboxTicketSink, TicketAttachment, TicketId, TicketPlan,
    TicketRequest, TicketSink,
};
pub use warehouse::SqliteWarehouse;

use crate::error::ReleaseResult;
use async_trait::async_trait;
use htan_common::Table;

/// Warehouse collaborator
#[async_trait]
pub trait ReleaseSink: Send + Sync {
    /// Replace the content of `name` wholesale
    async fn write_table(&self, name: &str, table: &Table) -> ReleaseResult<()>;

    /// Current content of `name`, `None` when the table was never written
    async fn read_table(&self, name: &str) -> ReleaseResult<Option<Table>>;
}

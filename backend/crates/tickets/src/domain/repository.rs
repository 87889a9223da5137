//! Repository Traits
//!
//! Interface to the ticket tables. Implementation is in the infra layer.

use kernel::id::UserId;

use crate::domain::entities::{NewTicket, Tag, Ticket, TicketComment, TicketHistory, TicketUpdate, TicketWithRelations};
use crate::domain::value_objects::{TagId, TicketId};
use crate::error::TicketResult;

/// Ticket repository trait
#[trait_variant::make(TicketRepository: Send)]
pub trait LocalTicketRepository {
    /// All visible tickets, newest first
    async fn list_tickets(&self) -> TicketResult<Vec<Ticket>>;

    /// One ticket with its comments and tags
    async fn get_ticket(&self, id: TicketId) -> TicketResult<Option<TicketWithRelations>>;

    async fn create_ticket(&self, ticket: &NewTicket) -> TicketResult<Ticket>;

    /// Fails with `NotFound` when no row matched
    async fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> TicketResult<Ticket>;

    async fn delete_ticket(&self, id: TicketId) -> TicketResult<()>;

    async fn add_comment(
        &self,
        ticket_id: TicketId,
        content: &str,
        user_id: Option<UserId>,
    ) -> TicketResult<TicketComment>;

    /// Field changes for a ticket, newest first
    async fn ticket_history(&self, ticket_id: TicketId) -> TicketResult<Vec<TicketHistory>>;

    async fn list_tags(&self) -> TicketResult<Vec<Tag>>;

    async fn add_tags(&self, ticket_id: TicketId, tag_ids: &[TagId]) -> TicketResult<()>;

    async fn remove_tag(&self, ticket_id: TicketId, tag_id: TagId) -> TicketResult<()>;
}

//! Create Ticket Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::{NewTicket, Ticket};
use crate::domain::repository::TicketRepository;
use crate::domain::value_objects::{TicketPriority, TicketStatus};
use crate::error::TicketResult;

/// Input DTO for create ticket
#[derive(Debug, Clone)]
pub struct CreateTicketInput {
    pub title: String,
    pub description: String,
    /// `Medium` when not chosen
    pub priority: Option<TicketPriority>,
    pub assignee_id: Option<UserId>,
}

/// Create Ticket Use Case
pub struct CreateTicketUseCase<R>
where
    R: TicketRepository,
{
    repo: Arc<R>,
}

impl<R> CreateTicketUseCase<R>
where
    R: TicketRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// New tickets always start `open` and are owned by `created_by`.
    pub async fn execute(&self, input: CreateTicketInput, created_by: UserId) -> TicketResult<Ticket> {
        let new_ticket = NewTicket {
            title: input.title,
            description: input.description,
            status: TicketStatus::Open,
            priority: input.priority.unwrap_or_default(),
            assignee_id: input.assignee_id,
            created_by: Some(created_by),
        };

        let ticket = self.repo.create_ticket(&new_ticket).await?;

        tracing::info!(
            ticket_id = ticket.id,
            priority = %ticket.priority,
            created_by = %created_by,
            "Ticket created"
        );

        Ok(ticket)
    }
}

//! PostgREST Repository Implementation
//!
//! Talks to the hosted data service's `/rest/v1` endpoints. Row-level
//! security decides what the caller sees, so requests carry the signed-in
//! user's access token when one is set.

use std::sync::Arc;

use kernel::id::UserId;
use platform::{ProviderClient, ProviderSettings};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    NewTicket, Tag, Ticket, TicketComment, TicketHistory, TicketUpdate, TicketWithRelations,
};
use crate::domain::repository::TicketRepository;
use crate::domain::value_objects::{TagId, TicketId};
use crate::error::{TicketError, TicketResult};

const TICKETS: &str = "rest/v1/tickets";
const COMMENTS: &str = "rest/v1/ticket_comments";
const HISTORY: &str = "rest/v1/ticket_history";
const TAGS: &str = "rest/v1/tags";
const TICKET_TAGS: &str = "rest/v1/ticket_tags";

/// Embedded selection for a single ticket
const WITH_RELATIONS: &str = "*,comments:ticket_comments(*),tags:ticket_tags(tag_id,tags(*))";

const NEWEST_FIRST: &str = "created_at.desc";

/// Ticket row with embedded relations, as PostgREST returns it
#[derive(Debug, Deserialize)]
struct TicketRow {
    #[serde(flatten)]
    ticket: Ticket,
    #[serde(default)]
    comments: Vec<TicketComment>,
    #[serde(default)]
    tags: Vec<TagLink>,
}

/// Join-table row with the tag embedded
#[derive(Debug, Deserialize)]
struct TagLink {
    tag_id: TagId,
    #[serde(default)]
    tags: Option<Tag>,
}

impl From<TicketRow> for TicketWithRelations {
    fn from(row: TicketRow) -> Self {
        let tags = row
            .tags
            .into_iter()
            .filter_map(|link| {
                if link.tags.is_none() {
                    tracing::debug!(tag_id = link.tag_id, "Tag link without visible tag");
                }
                link.tags
            })
            .collect();

        Self {
            ticket: row.ticket,
            comments: row.comments,
            history: Vec::new(),
            tags,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewComment<'a> {
    ticket_id: TicketId,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
struct NewTagLink {
    ticket_id: TicketId,
    tag_id: TagId,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// PostgREST-backed repository
#[derive(Clone, Debug)]
pub struct PostgrestTicketRepository {
    client: ProviderClient,
    access_token: Option<Arc<str>>,
}

impl PostgrestTicketRepository {
    pub fn new(client: ProviderClient) -> Self {
        Self {
            client,
            access_token: None,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> TicketResult<Self> {
        Ok(Self::new(ProviderClient::new(settings)?))
    }

    /// Act as the signed-in user instead of the anonymous role.
    pub fn with_access_token(mut self, access_token: impl AsRef<str>) -> Self {
        self.access_token = Some(Arc::from(access_token.as_ref()));
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, path, self.access_token.as_deref())
    }

    /// Write request that asks for the affected rows back
    fn returning(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path)
            .header("Prefer", "return=representation")
    }

    async fn fetch<T>(&self, request: RequestBuilder) -> TicketResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(self.client.send_json(request).await?)
    }
}

impl TicketRepository for PostgrestTicketRepository {
    async fn list_tickets(&self) -> TicketResult<Vec<Ticket>> {
        let request = self
            .request(Method::GET, TICKETS)
            .query(&[("select", "*"), ("order", NEWEST_FIRST)]);

        let tickets: Vec<Ticket> = self.fetch(request).await?;
        tracing::debug!(count = tickets.len(), "Listed tickets");
        Ok(tickets)
    }

    async fn get_ticket(&self, id: TicketId) -> TicketResult<Option<TicketWithRelations>> {
        let request = self
            .request(Method::GET, TICKETS)
            .query(&[("select", WITH_RELATIONS.to_string()), ("id", eq(id))]);

        let rows: Vec<TicketRow> = self.fetch(request).await?;
        Ok(rows.into_iter().next().map(TicketWithRelations::from))
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> TicketResult<Ticket> {
        let request = self.returning(Method::POST, TICKETS).json(ticket);

        self.fetch(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TicketError::Decode("insert returned no rows".into()))
    }

    async fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> TicketResult<Ticket> {
        if update.is_empty() {
            return Err(TicketError::EmptyUpdate);
        }

        let request = self
            .returning(Method::PATCH, TICKETS)
            .query(&[("id", eq(id))])
            .json(update);

        let ticket = self
            .fetch(request)
            .await?
            .into_iter()
            .next()
            .ok_or(TicketError::NotFound(id))?;

        tracing::info!(ticket_id = id, "Ticket updated");
        Ok(ticket)
    }

    async fn delete_ticket(&self, id: TicketId) -> TicketResult<()> {
        let request = self
            .request(Method::DELETE, TICKETS)
            .query(&[("id", eq(id))]);

        self.client.send_empty(request).await?;
        tracing::info!(ticket_id = id, "Ticket deleted");
        Ok(())
    }

    async fn add_comment(
        &self,
        ticket_id: TicketId,
        content: &str,
        user_id: Option<UserId>,
    ) -> TicketResult<TicketComment> {
        let request = self.returning(Method::POST, COMMENTS).json(&NewComment {
            ticket_id,
            content,
            user_id,
        });

        self.fetch(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TicketError::Decode("insert returned no rows".into()))
    }

    async fn ticket_history(&self, ticket_id: TicketId) -> TicketResult<Vec<TicketHistory>> {
        let request = self.request(Method::GET, HISTORY).query(&[
            ("select", "*".to_string()),
            ("ticket_id", eq(ticket_id)),
            ("order", NEWEST_FIRST.to_string()),
        ]);

        self.fetch(request).await
    }

    async fn list_tags(&self) -> TicketResult<Vec<Tag>> {
        let request = self
            .request(Method::GET, TAGS)
            .query(&[("select", "*"), ("order", "name.asc")]);

        self.fetch(request).await
    }

    async fn add_tags(&self, ticket_id: TicketId, tag_ids: &[TagId]) -> TicketResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let links: Vec<NewTagLink> = tag_ids
            .iter()
            .map(|&tag_id| NewTagLink { ticket_id, tag_id })
            .collect();
        let request = self.request(Method::POST, TICKET_TAGS).json(&links);

        self.client.send_empty(request).await?;
        tracing::debug!(ticket_id, count = links.len(), "Tags added");
        Ok(())
    }

    async fn remove_tag(&self, ticket_id: TicketId, tag_id: TagId) -> TicketResult<()> {
        let request = self
            .request(Method::DELETE, TICKET_TAGS)
            .query(&[("ticket_id", eq(ticket_id)), ("tag_id", eq(tag_id))]);

        self.client.send_empty(request).await?;
        Ok(())
    }
}

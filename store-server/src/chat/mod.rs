//! Chat thread store
//!
//! One persistent support conversation per user. Thread mutation is a
//! single-document read-modify-write; every message append publishes
//! `chat:message` to the owning user's channel *and* the admin
//! broadcast channel once the write committed, so any connected admin
//! sees all traffic while each user only sees their own thread. The
//! sender's own message is echoed back; clients de-duplicate.

use std::sync::Arc;

use serde::Serialize;
use surrealdb::RecordId;

use shared::Channel;
use shared::StoreEvent;
use shared::chat::{Attachment, ChatMessage, Sender, ThreadStatus};
use shared::util::{message_id, now_millis};
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::models::{ChatThread, ThreadStatusCount};
use crate::db::repository::ChatThreadRepository;
use crate::realtime::RealtimeHub;
use crate::utils::validation::{MAX_MESSAGE_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

/// Admin console listing page.
#[derive(Debug, Serialize)]
pub struct ThreadPage {
    pub threads: Vec<ChatThread>,
    pub total: i64,
    pub status_counts: Vec<ThreadStatusCount>,
    /// Unread-to-admin summed across all threads.
    pub unread_admin_total: i64,
}

#[derive(Clone)]
pub struct ChatService {
    threads: ChatThreadRepository,
    hub: Arc<RealtimeHub>,
}

impl ChatService {
    pub fn new(threads: ChatThreadRepository, hub: Arc<RealtimeHub>) -> Self {
        Self { threads, hub }
    }

    /// The user's single thread, created lazily on first access.
    pub async fn get_or_create(&self, user: &RecordId) -> AppResult<ChatThread> {
        Ok(self.threads.get_or_create(user).await?)
    }

    pub async fn find(&self, thread_id: &RecordId) -> AppResult<ChatThread> {
        self.threads
            .find_by_id(thread_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat thread {thread_id} not found")))
    }

    /// Append a message from the given identity.
    ///
    /// Bumps the opposite side's unread counter, refreshes
    /// `last_activity`, reopens a closed thread, and, when an
    /// unassigned thread receives its first reply from a *persisted*
    /// admin account, records the assignment. The built-in operator
    /// has no storable reference and never becomes `assigned_admin`.
    pub async fn append_message(
        &self,
        thread_id: &RecordId,
        identity: &Identity,
        body: String,
        attachments: Vec<Attachment>,
        client_key: Option<Uuid>,
    ) -> AppResult<(ChatThread, ChatMessage)> {
        validate_required_text(&body, "message body", MAX_MESSAGE_LEN)?;

        let mut thread = self.find(thread_id).await?;
        let sender = identity.chat_sender();

        let message = ChatMessage {
            message_id: message_id(),
            client_key,
            sender,
            sender_name: identity.display_name().to_string(),
            body,
            timestamp: now_millis(),
            is_read: false,
            attachments,
        };

        thread.messages.push(message.clone());
        thread.unread.bump_for(sender);
        thread.last_activity = message.timestamp;

        if sender == Sender::Admin
            && thread.assigned_admin.is_none()
            && let Some(admin_ref) = identity.account_ref()
        {
            thread.assigned_admin = Some(admin_ref.clone());
        }

        let reopened = thread.status == ThreadStatus::Closed;
        if reopened {
            thread.status = ThreadStatus::Active;
        }

        let thread = self.threads.save(&thread).await?;
        let channels = self.channels_for(&thread);
        self.hub.publish_to(
            &channels,
            StoreEvent::ChatMessage {
                chat_id: thread_id.to_string(),
                user_id: thread.user.to_string(),
                message: message.clone(),
                unread: thread.unread,
            },
        );
        if reopened {
            self.publish_status(&thread);
        }

        Ok((thread, message))
    }

    /// Viewing a thread: mark the *other* party's messages read and
    /// clear the reader's own pending-unread tally. Counters only reset
    /// when at least one message actually flipped.
    pub async fn mark_read(&self, thread_id: &RecordId, reader: Sender) -> AppResult<ChatThread> {
        let mut thread = self.find(thread_id).await?;

        let mut flipped = false;
        for message in &mut thread.messages {
            if message.sender == reader.opposite() && !message.is_read {
                message.is_read = true;
                flipped = true;
            }
        }
        if !flipped {
            return Ok(thread);
        }

        thread.unread.clear_for(reader);
        Ok(self.threads.save(&thread).await?)
    }

    /// Admin open/close/reassign. A reassignment can only store a
    /// persisted account reference, by construction of [`Identity`].
    pub async fn set_status(
        &self,
        thread_id: &RecordId,
        status: ThreadStatus,
        assigned_admin: Option<RecordId>,
    ) -> AppResult<ChatThread> {
        let mut thread = self.find(thread_id).await?;
        thread.status = status;
        if let Some(admin) = assigned_admin {
            thread.assigned_admin = Some(admin);
        }
        let thread = self.threads.save(&thread).await?;
        self.publish_status(&thread);
        Ok(thread)
    }

    /// Admin console listing with per-status aggregates.
    pub async fn list(
        &self,
        status: Option<ThreadStatus>,
        page: i64,
        limit: i64,
    ) -> AppResult<ThreadPage> {
        let limit = limit.clamp(1, 100);
        let start = (page.max(1) - 1) * limit;
        let threads = self.threads.list(status, limit, start).await?;
        let total = self.threads.count(status).await?;
        let status_counts = self.threads.counts_by_status().await?;
        let unread_admin_total = self.threads.total_unread_admin().await?;
        Ok(ThreadPage {
            threads,
            total,
            status_counts,
            unread_admin_total,
        })
    }

    /// Admin-only hard delete.
    pub async fn delete(&self, thread_id: &RecordId) -> AppResult<()> {
        let thread = self.threads.delete(thread_id).await?;
        let channels = self.channels_for(&thread);
        self.hub.publish_to(
            &channels,
            StoreEvent::ChatDelete {
                chat_id: thread_id.to_string(),
                user_id: thread.user.to_string(),
            },
        );
        Ok(())
    }

    fn channels_for(&self, thread: &ChatThread) -> [Channel; 2] {
        [
            Channel::User(thread.user.key().to_string()),
            Channel::Broadcast,
        ]
    }

    fn publish_status(&self, thread: &ChatThread) {
        let Some(id) = &thread.id else { return };
        let channels = self.channels_for(thread);
        self.hub.publish_to(
            &channels,
            StoreEvent::ChatUpdate {
                chat_id: id.to_string(),
                user_id: thread.user.to_string(),
                status: thread.status,
                assigned_admin: thread.assigned_admin.as_ref().map(|a| a.to_string()),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::DbService;
    use shared::chat::UnreadCount;

    struct Fixture {
        service: ChatService,
        hub: Arc<RealtimeHub>,
        user: RecordId,
    }

    async fn fixture() -> Fixture {
        let db = DbService::memory().await.unwrap().db;
        let hub = Arc::new(RealtimeHub::new());
        Fixture {
            service: ChatService::new(ChatThreadRepository::new(db), hub.clone()),
            hub,
            user: RecordId::from_table_key("user", "u1"),
        }
    }

    fn customer(fix: &Fixture) -> Identity {
        Identity::Account {
            id: fix.user.clone(),
            name: "Ana".into(),
            role: Role::Customer,
        }
    }

    fn admin() -> Identity {
        Identity::Account {
            id: RecordId::from_table_key("user", "staff1"),
            name: "Sam".into(),
            role: Role::Admin,
        }
    }

    async fn send(fix: &Fixture, identity: &Identity, body: &str) -> (ChatThread, ChatMessage) {
        let thread = fix.service.get_or_create(&fix.user).await.unwrap();
        fix.service
            .append_message(
                &thread.id.unwrap(),
                identity,
                body.into(),
                vec![],
                None,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let fix = fixture().await;
        let first = fix.service.get_or_create(&fix.user).await.unwrap();
        let second = fix.service.get_or_create(&fix.user).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.unread, UnreadCount::default());
        assert!(first.messages.is_empty());
    }

    #[tokio::test]
    async fn user_messages_bump_only_admin_unread() {
        let fix = fixture().await;
        let (thread, message) = send(&fix, &customer(&fix), "hello").await;
        assert_eq!(thread.unread, UnreadCount { user: 0, admin: 1 });
        assert_eq!(message.sender, Sender::User);
        assert!(!message.is_read);

        let (thread, _) = send(&fix, &admin(), "hi Ana").await;
        assert_eq!(thread.unread, UnreadCount { user: 1, admin: 1 });
    }

    #[tokio::test]
    async fn blank_bodies_are_rejected() {
        let fix = fixture().await;
        let thread = fix.service.get_or_create(&fix.user).await.unwrap();
        let err = fix
            .service
            .append_message(&thread.id.unwrap(), &customer(&fix), "   ".into(), vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn admin_view_clears_unread_and_flips_user_messages() {
        let fix = fixture().await;
        let user = customer(&fix);
        send(&fix, &user, "one").await;
        send(&fix, &user, "two").await;
        let (thread, _) = send(&fix, &user, "three").await;
        assert_eq!(thread.unread, UnreadCount { user: 0, admin: 3 });

        let thread = fix
            .service
            .mark_read(&thread.id.unwrap(), Sender::Admin)
            .await
            .unwrap();
        assert_eq!(thread.unread, UnreadCount { user: 0, admin: 0 });
        assert!(thread.messages.iter().all(|m| m.is_read));
    }

    #[tokio::test]
    async fn mark_read_leaves_own_messages_untouched() {
        let fix = fixture().await;
        send(&fix, &customer(&fix), "question").await;
        let (thread, _) = send(&fix, &admin(), "answer").await;

        let thread = fix
            .service
            .mark_read(&thread.id.unwrap(), Sender::Admin)
            .await
            .unwrap();
        // The admin's own message stays unread until the user views it
        let admin_msg = thread
            .messages
            .iter()
            .find(|m| m.sender == Sender::Admin)
            .unwrap();
        assert!(!admin_msg.is_read);
        assert_eq!(thread.unread.admin, 0);
        assert_eq!(thread.unread.user, 1);
    }

    #[tokio::test]
    async fn sending_to_a_closed_thread_reopens_it() {
        let fix = fixture().await;
        let (thread, _) = send(&fix, &customer(&fix), "first").await;
        let thread_id = thread.id.unwrap();
        fix.service
            .set_status(&thread_id, ThreadStatus::Closed, None)
            .await
            .unwrap();

        let (thread, _) = fix
            .service
            .append_message(&thread_id, &customer(&fix), "anyone there?".into(), vec![], None)
            .await
            .unwrap();
        assert_eq!(thread.status, ThreadStatus::Active);
    }

    #[tokio::test]
    async fn first_real_admin_reply_claims_the_thread() {
        let fix = fixture().await;
        let (thread, _) = send(&fix, &customer(&fix), "help").await;
        assert!(thread.assigned_admin.is_none());

        let (thread, _) = send(&fix, &admin(), "on it").await;
        assert_eq!(
            thread.assigned_admin,
            Some(RecordId::from_table_key("user", "staff1"))
        );

        // A later reply from someone else does not steal the assignment
        let other = Identity::Account {
            id: RecordId::from_table_key("user", "staff2"),
            name: "Kim".into(),
            role: Role::Admin,
        };
        let (thread, _) = send(&fix, &other, "also here").await;
        assert_eq!(
            thread.assigned_admin,
            Some(RecordId::from_table_key("user", "staff1"))
        );
    }

    #[tokio::test]
    async fn builtin_admin_is_never_stored_as_assignee() {
        let fix = fixture().await;
        send(&fix, &customer(&fix), "help").await;
        let (thread, message) = send(&fix, &Identity::BuiltinAdmin, "hello from support").await;
        assert!(thread.assigned_admin.is_none());
        assert_eq!(message.sender, Sender::Admin);
        assert_eq!(message.sender_name, "Support");
    }

    #[tokio::test]
    async fn chat_messages_fan_out_to_user_and_broadcast() {
        let fix = fixture().await;
        let mut user_rx = fix.hub.subscribe(&Channel::user("u1"));
        let mut admin_rx = fix.hub.subscribe(&Channel::Broadcast);

        send(&fix, &customer(&fix), "ping").await;

        assert_eq!(user_rx.recv().await.unwrap().name(), "chat:message");
        assert_eq!(admin_rx.recv().await.unwrap().name(), "chat:message");
    }

    #[tokio::test]
    async fn listing_aggregates_statuses_and_unread() {
        let fix = fixture().await;
        send(&fix, &customer(&fix), "one").await;
        send(&fix, &customer(&fix), "two").await;

        // Ensure a strictly later last_activity for the second thread
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let other_user = RecordId::from_table_key("user", "u2");
        let other_thread = fix.service.get_or_create(&other_user).await.unwrap();
        let other_id = other_thread.id.unwrap();
        fix.service
            .append_message(
                &other_id,
                &Identity::Account {
                    id: other_user,
                    name: "Bo".into(),
                    role: Role::Customer,
                },
                "hey".into(),
                vec![],
                None,
            )
            .await
            .unwrap();
        fix.service
            .set_status(&other_id, ThreadStatus::Closed, None)
            .await
            .unwrap();

        let page = fix.service.list(None, 1, 20).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.unread_admin_total, 3);
        // Most recently active first
        assert_eq!(page.threads[0].id, Some(other_id.clone()));

        let closed = fix
            .service
            .list(Some(ThreadStatus::Closed), 1, 20)
            .await
            .unwrap();
        assert_eq!(closed.total, 1);
        assert_eq!(closed.threads[0].id, Some(other_id));
    }

    #[tokio::test]
    async fn delete_emits_chat_delete_on_both_channels() {
        let fix = fixture().await;
        let (thread, _) = send(&fix, &customer(&fix), "bye").await;
        let thread_id = thread.id.unwrap();

        let mut user_rx = fix.hub.subscribe(&Channel::user("u1"));
        let mut admin_rx = fix.hub.subscribe(&Channel::Broadcast);
        fix.service.delete(&thread_id).await.unwrap();

        assert_eq!(user_rx.recv().await.unwrap().name(), "chat:delete");
        assert_eq!(admin_rx.recv().await.unwrap().name(), "chat:delete");
        assert!(matches!(
            fix.service.find(&thread_id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}

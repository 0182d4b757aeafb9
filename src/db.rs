//! In-memory store backing every service trait. All tables sit behind one
//! lock so id assignment and writes are serialized.

use std::collections::BTreeSet;

use anyhow::{bail, Context};
use async_trait::async_trait;
use time::macros::datetime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    auth::repo::AuthenticationService,
    boxes::{
        repo::BoxService,
        repo_types::{CloseEvent, OpenEvent, PillBox},
    },
    pills::{
        repo::PillService,
        repo_types::{Pill, TimeOfDay},
    },
    users::{repo::UserService, repo_types::User},
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    pills: Vec<Pill>,
    boxes: Vec<PillBox>,
    open_events: Vec<OpenEvent>,
    close_events: Vec<CloseEvent>,
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

#[derive(Debug, Default)]
pub struct MemoryDb {
    tables: RwLock<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo accounts, one pill and one box.
    pub fn seeded() -> Self {
        let user = |id: i64, email: &str| User {
            id,
            email: email.into(),
            password: "password".into(),
            first_name: "Jacob".into(),
            last_name: "Smith".into(),
            archived: false,
        };
        let tables = Tables {
            users: vec![
                user(1, "jacob.smith@unb.ca"),
                user(2, "j.a.smith@live.ca"),
                user(3, "jacobsmithunb@gmail.com"),
            ],
            pills: vec![Pill {
                id: 1,
                user_id: 1,
                name: "DoxyPoxy".into(),
                days_of_week: BTreeSet::from([1, 2, 3, 4, 5, 6, 7]),
                times_of_day: vec![TimeOfDay(datetime!(2024-01-01 08:00:00 UTC))],
                archived: false,
            }],
            boxes: vec![PillBox { id: 1, user_id: 1 }],
            ..Default::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl UserService for MemoryDb {
    async fn user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn insert_user(&self, mut user: User) -> anyhow::Result<User> {
        if user.id != 0 {
            bail!("user id must equal 0");
        }
        let mut t = self.tables.write().await;
        user.id = next_id(t.users.iter().map(|u| u.id));
        t.users.push(user.clone());
        debug!(user_id = user.id, "user inserted");
        Ok(user)
    }

    async fn update_user(&self, id: i64, user: User) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        let slot = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .with_context(|| format!("user {id} not found"))?;
        *slot = user;
        Ok(())
    }
}

#[async_trait]
impl PillService for MemoryDb {
    async fn pill(&self, id: i64) -> anyhow::Result<Option<Pill>> {
        let t = self.tables.read().await;
        Ok(t.pills.iter().find(|p| p.id == id).cloned())
    }

    async fn pills(&self, user_id: i64) -> anyhow::Result<Vec<Pill>> {
        let t = self.tables.read().await;
        Ok(t.pills.iter().filter(|p| p.user_id == user_id).cloned().collect())
    }

    async fn create_pill(&self, mut pill: Pill) -> anyhow::Result<Pill> {
        if pill.id != 0 {
            bail!("pill id must equal 0");
        }
        let mut t = self.tables.write().await;
        pill.id = next_id(t.pills.iter().map(|p| p.id));
        t.pills.push(pill.clone());
        debug!(pill_id = pill.id, "pill inserted");
        Ok(pill)
    }

    async fn update_pill(&self, id: i64, pill: Pill) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        let slot = t
            .pills
            .iter_mut()
            .find(|p| p.id == id)
            .with_context(|| format!("pill {id} not found"))?;
        *slot = pill;
        Ok(())
    }
}

#[async_trait]
impl BoxService for MemoryDb {
    async fn box_by_id(&self, id: i64) -> anyhow::Result<Option<PillBox>> {
        let t = self.tables.read().await;
        Ok(t.boxes.iter().find(|b| b.id == id).cloned())
    }

    async fn boxes(&self, user_id: i64) -> anyhow::Result<Vec<PillBox>> {
        let t = self.tables.read().await;
        Ok(t.boxes.iter().filter(|b| b.user_id == user_id).cloned().collect())
    }

    async fn insert_open_event(&self, mut event: OpenEvent) -> anyhow::Result<OpenEvent> {
        let mut t = self.tables.write().await;
        event.id = next_id(t.open_events.iter().map(|e| e.id));
        t.open_events.push(event.clone());
        Ok(event)
    }

    async fn insert_close_event(&self, mut event: CloseEvent) -> anyhow::Result<CloseEvent> {
        let mut t = self.tables.write().await;
        event.id = next_id(t.close_events.iter().map(|e| e.id));
        t.close_events.push(event.clone());
        Ok(event)
    }
}

#[async_trait]
impl AuthenticationService for MemoryDb {
    async fn authenticate(&self, email: &str, password: &str) -> anyhow::Result<bool> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .iter()
            .find(|u| u.email == email)
            .is_some_and(|u| u.password == password))
    }

    async fn email_available(&self, email: &str) -> anyhow::Result<bool> {
        let t = self.tables.read().await;
        Ok(!t.users.iter().any(|u| u.email == email))
    }
}

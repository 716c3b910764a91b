use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::bins::{Bin, BinPatch, NewBin};
use crate::detection::{Detection, RecyclingReceipt, SubmittedItem};
use crate::errors::BackendError;
use crate::times::Times;
use crate::user::{NewUser, StoredCredentials, User};

#[derive(Clone, Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// An in-memory [`Db`](super::Db) for filter tests. One mutex guards
/// each table; `submit_recycling` holds the users lock across the whole
/// read-modify-write, giving it the same serialized-per-user behavior
/// the live store gets from its row lock.
#[derive(Default)]
pub(crate) struct MockDb {
    users: Mutex<HashMap<Uuid, StoredUser>>,
    detections: Mutex<Vec<Detection>>,
    bins: Mutex<HashMap<Uuid, Bin>>,
    fail_submissions: AtomicBool,
}

impl MockDb {
    pub fn new() -> Self {
        Default::default()
    }

    /// Makes every subsequent submission fail before anything is
    /// recorded, simulating a store outage.
    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }
}

impl super::Db for MockDb {
    fn list_bins(&self) -> BoxFuture<Result<Vec<Bin>, BackendError>> {
        let mut bins: Vec<Bin> = self.bins.lock().unwrap().values().cloned().collect();
        bins.sort_by(|a, b| a.public_id().cmp(b.public_id()));

        async move { Ok(bins) }.boxed()
    }

    fn retrieve_bin(&self, id: &Uuid) -> BoxFuture<Result<Option<Bin>, BackendError>> {
        let bin = self.bins.lock().unwrap().get(id).cloned();

        async move { Ok(bin) }.boxed()
    }

    fn insert_bin(&self, fields: NewBin) -> BoxFuture<Result<Bin, BackendError>> {
        let mut bins = self.bins.lock().unwrap();

        let result = if bins.values().any(|bin| bin.public_id() == fields.public_id) {
            Err(BackendError::BinIdAlreadyExists)
        } else {
            let id = Uuid::new_v4();
            let now = OffsetDateTime::now_utc();
            let bin = Bin::new(
                id,
                fields.public_id,
                fields.name,
                fields.lat,
                fields.lng,
                fields.address,
                fields.accepted_items,
                fields.fill_level,
                fields.status,
                fields.battery,
                Times::new(now, now),
            );

            bins.insert(id, bin.clone());

            Ok(bin)
        };

        async move { result }.boxed()
    }

    fn update_bin(
        &self,
        id: &Uuid,
        patch: BinPatch,
    ) -> BoxFuture<Result<Option<Bin>, BackendError>> {
        let mut bins = self.bins.lock().unwrap();

        let updated = bins.get(id).map(|bin| bin.patched(patch));

        if let Some(ref bin) = updated {
            bins.insert(*id, bin.clone());
        }

        async move { Ok(updated) }.boxed()
    }

    fn delete_bin(&self, id: &Uuid) -> BoxFuture<Result<Option<Bin>, BackendError>> {
        let bin = self.bins.lock().unwrap().remove(id);

        async move { Ok(bin) }.boxed()
    }

    fn insert_user(&self, fields: NewUser) -> BoxFuture<Result<User, BackendError>> {
        let mut users = self.users.lock().unwrap();

        let result = if users
            .values()
            .any(|stored| stored.user.email() == fields.email)
        {
            Err(BackendError::EmailAlreadyExists)
        } else {
            let id = Uuid::new_v4();
            let now = OffsetDateTime::now_utc();
            let user = User::new(
                id,
                fields.name,
                fields.email,
                fields.phone,
                fields.user_type,
                0,
                0,
                0.0,
                vec![],
                Times::new(now, now),
            );

            users.insert(
                id,
                StoredUser {
                    user: user.clone(),
                    password_hash: fields.password_hash,
                },
            );

            Ok(user)
        };

        async move { result }.boxed()
    }

    fn retrieve_user(&self, id: &Uuid) -> BoxFuture<Result<Option<User>, BackendError>> {
        let user = self
            .users
            .lock()
            .unwrap()
            .get(id)
            .map(|stored| stored.user.clone());

        async move { Ok(user) }.boxed()
    }

    fn retrieve_credentials(
        &self,
        email: &str,
    ) -> BoxFuture<Result<Option<StoredCredentials>, BackendError>> {
        let credentials = self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|stored| stored.user.email() == email)
            .map(|stored| StoredCredentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            });

        async move { Ok(credentials) }.boxed()
    }

    fn submit_recycling(
        &self,
        user_id: &Uuid,
        item: SubmittedItem,
    ) -> BoxFuture<Result<RecyclingReceipt, BackendError>> {
        let result = (|| {
            let mut users = self.users.lock().unwrap();

            let stored = users
                .get_mut(user_id)
                .ok_or(BackendError::NonExistentUser(*user_id))?;

            if self.fail_submissions.load(Ordering::SeqCst) {
                return Err(BackendError::Unavailable {
                    source: sqlx::Error::PoolTimedOut,
                });
            }

            let updated = stored.user.with_rewards(&item);
            let detection =
                Detection::new(Uuid::new_v4(), *user_id, item, OffsetDateTime::now_utc());

            stored.user = updated.clone();
            self.detections.lock().unwrap().push(detection.clone());

            Ok(RecyclingReceipt::new(updated, detection))
        })();

        async move { result }.boxed()
    }

    fn recent_detections(
        &self,
        user_id: &Uuid,
        limit: i64,
    ) -> BoxFuture<Result<Vec<Detection>, BackendError>> {
        let detections: Vec<Detection> = self
            .detections
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|detection| detection.user_id() == user_id)
            .take(limit as usize)
            .cloned()
            .collect();

        async move { Ok(detections) }.boxed()
    }
}

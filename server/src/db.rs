use futures::future::BoxFuture;
use uuid::Uuid;

use crate::bins::{Bin, BinPatch, NewBin};
use crate::detection::{Detection, RecyclingReceipt, SubmittedItem};
use crate::errors::BackendError;
use crate::user::{NewUser, StoredCredentials, User};

#[cfg(test)]
pub(crate) mod mock;

pub trait Db {
    fn list_bins(&self) -> BoxFuture<Result<Vec<Bin>, BackendError>>;

    fn retrieve_bin(&self, id: &Uuid) -> BoxFuture<Result<Option<Bin>, BackendError>>;

    fn insert_bin(&self, fields: NewBin) -> BoxFuture<Result<Bin, BackendError>>;

    fn update_bin(&self, id: &Uuid, patch: BinPatch)
        -> BoxFuture<Result<Option<Bin>, BackendError>>;

    fn delete_bin(&self, id: &Uuid) -> BoxFuture<Result<Option<Bin>, BackendError>>;

    fn insert_user(&self, fields: NewUser) -> BoxFuture<Result<User, BackendError>>;

    fn retrieve_user(&self, id: &Uuid) -> BoxFuture<Result<Option<User>, BackendError>>;

    fn retrieve_credentials(
        &self,
        email: &str,
    ) -> BoxFuture<Result<Option<StoredCredentials>, BackendError>>;

    /// Records one recycling event and applies its rewards to the
    /// submitting user as a single unit. Either both the detection and
    /// the user update become visible, or neither does.
    fn submit_recycling(
        &self,
        user_id: &Uuid,
        item: SubmittedItem,
    ) -> BoxFuture<Result<RecyclingReceipt, BackendError>>;

    fn recent_detections(
        &self,
        user_id: &Uuid,
        limit: i64,
    ) -> BoxFuture<Result<Vec<Detection>, BackendError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::postgres::{PgPool, PgRow};
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::bins::{Bin, BinPatch, BinStatus, NewBin};
    use crate::detection::{Detection, RecyclingReceipt, SubmittedItem};
    use crate::errors::BackendError;
    use crate::rewards;
    use crate::times::Times;
    use crate::user::{NewUser, StoredCredentials, User, UserType};

    const USERS_EMAIL_CONSTRAINT: &str = "users_email";
    const BINS_PUBLIC_ID_CONSTRAINT: &str = "bins_public_id";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn list_bins(&self) -> BoxFuture<Result<Vec<Bin>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_bins.sql"));

                let bins = query
                    .try_map(row_to_bin)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(bins)
            }
            .boxed()
        }

        fn retrieve_bin(&self, id: &Uuid) -> BoxFuture<Result<Option<Bin>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_bin.sql"));

                let bin = query
                    .bind(id)
                    .try_map(row_to_bin)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(bin)
            }
            .boxed()
        }

        fn insert_bin(&self, fields: NewBin) -> BoxFuture<Result<Bin, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_bin.sql"));

                let bin = query
                    .bind(&fields.public_id)
                    .bind(&fields.name)
                    .bind(fields.lat)
                    .bind(fields.lng)
                    .bind(&fields.address)
                    .bind(&fields.accepted_items)
                    .bind(fields.fill_level)
                    .bind(fields.status.as_str())
                    .bind(fields.battery)
                    .try_map(row_to_bin)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(bin)
            }
            .boxed()
        }

        fn update_bin(
            &self,
            id: &Uuid,
            patch: BinPatch,
        ) -> BoxFuture<Result<Option<Bin>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/update_bin.sql"));

                let bin = query
                    .bind(id)
                    .bind(&patch.public_id)
                    .bind(&patch.name)
                    .bind(patch.lat)
                    .bind(patch.lng)
                    .bind(&patch.address)
                    .bind(&patch.accepted_items)
                    .bind(patch.fill_level)
                    .bind(patch.status.map(|status| status.as_str()))
                    .bind(patch.battery)
                    .try_map(row_to_bin)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(bin)
            }
            .boxed()
        }

        fn delete_bin(&self, id: &Uuid) -> BoxFuture<Result<Option<Bin>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/delete_bin.sql"));

                let bin = query
                    .bind(id)
                    .try_map(row_to_bin)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(bin)
            }
            .boxed()
        }

        fn insert_user(&self, fields: NewUser) -> BoxFuture<Result<User, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/create_user.sql"));

                let user = query
                    .bind(&fields.name)
                    .bind(&fields.email)
                    .bind(&fields.phone)
                    .bind(&fields.password_hash)
                    .bind(fields.user_type.as_str())
                    .try_map(row_to_user)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(user)
            }
            .boxed()
        }

        fn retrieve_user(&self, id: &Uuid) -> BoxFuture<Result<Option<User>, BackendError>> {
            let id = *id;

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_user.sql"));

                let user = query
                    .bind(id)
                    .try_map(row_to_user)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(user)
            }
            .boxed()
        }

        fn retrieve_credentials(
            &self,
            email: &str,
        ) -> BoxFuture<Result<Option<StoredCredentials>, BackendError>> {
            let email = email.to_owned();

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_credentials.sql"));

                let credentials = query
                    .bind(email)
                    .try_map(|row: PgRow| {
                        let password_hash: String = try_get(&row, "password_hash")?;
                        let user = row_to_user(row)?;

                        Ok(StoredCredentials {
                            user,
                            password_hash,
                        })
                    })
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(credentials)
            }
            .boxed()
        }

        fn submit_recycling(
            &self,
            user_id: &Uuid,
            item: SubmittedItem,
        ) -> BoxFuture<Result<RecyclingReceipt, BackendError>> {
            let user_id = *user_id;

            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                // the row lock serializes submissions per user
                let locked = sqlx::query(include_str!("queries/lock_user.sql"))
                    .bind(user_id)
                    .try_map(|row: PgRow| {
                        let total_recycled: i64 = try_get(&row, "total_recycled")?;
                        let badges: Vec<String> = try_get(&row, "badges")?;

                        Ok((total_recycled, badges))
                    })
                    .fetch_optional(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                let (total_recycled, mut badges) =
                    locked.ok_or(BackendError::NonExistentUser(user_id))?;

                let (detection_id, created_at): (Uuid, OffsetDateTime) =
                    sqlx::query_as(include_str!("queries/create_detection.sql"))
                        .bind(user_id)
                        .bind(&item.item_type)
                        .bind(&item.name)
                        .bind(item.confidence)
                        .bind(item.weight)
                        .bind(item.value)
                        .bind(item.points)
                        .bind(item.co2_saved)
                        .bind(&item.condition)
                        .bind(item.image.as_deref())
                        .fetch_one(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                if let Some(badge) = rewards::earned_badge(total_recycled + 1, &badges) {
                    badges.push(badge.to_owned());
                }

                let updated_user = sqlx::query(include_str!("queries/apply_rewards.sql"))
                    .bind(user_id)
                    .bind(item.points)
                    .bind(item.co2_saved)
                    .bind(&badges)
                    .try_map(row_to_user)
                    .fetch_one(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                tx.commit().await.map_err(map_sqlx_error)?;

                let saved_detection = Detection::new(detection_id, user_id, item, created_at);

                Ok(RecyclingReceipt::new(updated_user, saved_detection))
            }
            .boxed()
        }

        fn recent_detections(
            &self,
            user_id: &Uuid,
            limit: i64,
        ) -> BoxFuture<Result<Vec<Detection>, BackendError>> {
            let user_id = *user_id;

            async move {
                let query = sqlx::query(include_str!("queries/recent_detections.sql"));

                let detections = query
                    .bind(user_id)
                    .bind(limit)
                    .try_map(row_to_detection)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(detections)
            }
            .boxed()
        }
    }

    fn row_to_user(row: PgRow) -> Result<User, sqlx::Error> {
        let user_type: String = try_get(&row, "user_type")?;
        let user_type =
            UserType::parse(&user_type).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(User::new(
            try_get(&row, "id")?,
            try_get(&row, "name")?,
            try_get(&row, "email")?,
            try_get(&row, "phone")?,
            user_type,
            try_get(&row, "points")?,
            try_get(&row, "total_recycled")?,
            try_get(&row, "co2_saved")?,
            try_get(&row, "badges")?,
            Times::new(try_get(&row, "created_at")?, try_get(&row, "updated_at")?),
        ))
    }

    fn row_to_bin(row: PgRow) -> Result<Bin, sqlx::Error> {
        let status: String = try_get(&row, "status")?;
        let status = BinStatus::parse(&status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Bin::new(
            try_get(&row, "id")?,
            try_get(&row, "public_id")?,
            try_get(&row, "name")?,
            try_get(&row, "lat")?,
            try_get(&row, "lng")?,
            try_get(&row, "address")?,
            try_get(&row, "accepted_items")?,
            try_get(&row, "fill_level")?,
            status,
            try_get(&row, "battery")?,
            Times::new(try_get(&row, "created_at")?, try_get(&row, "updated_at")?),
        ))
    }

    fn row_to_detection(row: PgRow) -> Result<Detection, sqlx::Error> {
        let item = SubmittedItem {
            item_type: try_get(&row, "item_type")?,
            name: try_get(&row, "name")?,
            confidence: try_get(&row, "confidence")?,
            weight: try_get(&row, "weight")?,
            value: try_get(&row, "value")?,
            points: try_get(&row, "points")?,
            co2_saved: try_get(&row, "co2_saved")?,
            condition: try_get(&row, "condition")?,
            image: try_get(&row, "image")?,
        };

        Ok(Detection::new(
            try_get(&row, "id")?,
            try_get(&row, "user_id")?,
            item,
            try_get(&row, "created_at")?,
        ))
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::Row as _;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e) if e.constraint() == Some(USERS_EMAIL_CONSTRAINT) => {
                BackendError::EmailAlreadyExists
            }
            Error::Database(ref e) if e.constraint() == Some(BINS_PUBLIC_ID_CONSTRAINT) => {
                BackendError::BinIdAlreadyExists
            }
            Error::PoolTimedOut | Error::Io(_) => BackendError::Unavailable { source: error },
            _ => BackendError::Sqlx { source: error },
        }
    }
}

//! PostgreSQL-backed `UserDirectory`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{EmailAddress, User, UserId, UserRole};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewUserRow, UserRow, coins_to_db};
use super::pool::{DbPool, PoolError};
use super::schema::users;

#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserDirectoryError {
    UserDirectoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, email: Option<&EmailAddress>) -> UserDirectoryError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { .. } => match email {
            Some(email) => UserDirectoryError::duplicate_email(email.to_string()),
            None => UserDirectoryError::query("unique constraint violated"),
        },
        DieselFailure::ConnectionLost => UserDirectoryError::connection("database connection error"),
        failure => UserDirectoryError::query(failure.message()),
    }
}

fn to_domain(row: UserRow) -> Result<User, UserDirectoryError> {
    User::try_from(row).map_err(|err| UserDirectoryError::query(err.to_string()))
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?
            .map(to_domain)
            .transpose()
    }

    async fn create(&self, user: &User) -> Result<(), UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            password_hash: user.password.as_ref(),
            coin_balance: coins_to_db(user.coin_balance).map_err(UserDirectoryError::query)?,
            role: user.role.as_str(),
            created_at: user.created_at,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, Some(&user.email)))
    }

    async fn set_role(
        &self,
        id: &UserId,
        role: UserRole,
    ) -> Result<Option<User>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(users::role.eq(role.as_str()))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?
            .map(to_domain)
            .transpose()
    }
}

//! Users service
//!
//! Minimal account records that own spaces.

use crate::database::{CreateUserRequest, Repository, User};
use crate::error::Result;

/// Service for managing users
#[derive(Clone)]
pub struct UsersService {
    repo: Repository,
}

impl UsersService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Register a user, `Conflict` when the email is already taken
    pub async fn create_user(&self, name: String, email: String) -> Result<User> {
        tracing::info!("Creating user: {}", name);

        // Stored lowercased so uniqueness ignores case
        let user = self
            .repo
            .create_user(CreateUserRequest {
                name,
                email: email.trim().to_lowercase(),
            })
            .await?;

        tracing::info!("User created successfully: {}", user.user_id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.repo.get_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::error::AppError;

    async fn create_test_service() -> UsersService {
        UsersService::new(Repository::new(memory_pool().await))
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let service = create_test_service().await;

        let user = service
            .create_user("Ada".to_string(), "Ada@Example.com ".to_string())
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");

        let fetched = service.get_user(user.user_id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_email_is_unique_ignoring_case() {
        let service = create_test_service().await;

        service
            .create_user("Ada".to_string(), "ada@example.com".to_string())
            .await
            .unwrap();

        let result = service
            .create_user("Imposter".to_string(), "ADA@example.com".to_string())
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let service = create_test_service().await;

        assert!(matches!(service.get_user(5).await, Err(AppError::NotFound(_))));
    }
}

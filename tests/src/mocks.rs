//! Mock implementations for testing.

use async_trait::async_trait;
use dashboard_core::{LoginRequest, LoginResponse, Record, Resource, Session, UserProfile};
use fetcher::{Action, FetchError, FetchResult, ResourceSource};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A user the mock API accepts.
#[derive(Debug, Clone)]
struct Account {
    email: String,
    password: String,
    token: String,
    profile: UserProfile,
}

/// In-memory stand-in for the SOC REST API.
///
/// Implements the same `ResourceSource` trait as `ApiClient`, so the router
/// runs its production code paths against canned records.
#[derive(Clone, Default)]
pub struct MockSource {
    data: Arc<Mutex<HashMap<Resource, Vec<Record>>>>,
    failures: Arc<Mutex<HashMap<Resource, FetchError>>>,
    accounts: Arc<Mutex<Vec<Account>>>,
    /// Every fetch as (resource, bearer token).
    fetches: Arc<Mutex<Vec<(Resource, Option<String>)>>>,
    actions: Arc<Mutex<Vec<Action>>>,
    /// Simulate an unreachable API if set.
    should_fail: Arc<Mutex<bool>>,
    /// Answer every authenticated call with 401 if set.
    reject_tokens: Arc<Mutex<bool>>,
    delay: Arc<Mutex<Duration>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the records of a resource.
    pub fn set_records(&self, resource: Resource, rows: Vec<Value>) {
        let records = rows
            .into_iter()
            .filter_map(|row| Record::try_from(row).ok())
            .collect();
        self.data.lock().insert(resource, records);
    }

    /// Makes one resource fail with the given error.
    pub fn fail_resource(&self, resource: Resource, error: FetchError) {
        self.failures.lock().insert(resource, error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn add_account(&self, email: &str, password: &str, token: &str, profile: UserProfile) {
        self.accounts.lock().push(Account {
            email: email.to_string(),
            password: password.to_string(),
            token: token.to_string(),
            profile,
        });
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn set_reject_tokens(&self, reject: bool) {
        *self.reject_tokens.lock() = reject;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Resources fetched so far, in call order.
    pub fn fetched(&self) -> Vec<Resource> {
        self.fetches.lock().iter().map(|(r, _)| *r).collect()
    }

    /// Bearer tokens sent so far.
    pub fn tokens_seen(&self) -> Vec<Option<String>> {
        self.fetches.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.fetches.lock().clear();
        self.actions.lock().clear();
    }

    /// `GET /users/:id` for the session user, served from the user list.
    fn own_user(&self, resource: Resource, session: Option<&Session>) -> FetchResult<Vec<Record>> {
        let unauthorized = || FetchError::Unauthorized {
            resource: resource.path().to_string(),
            status: 401,
        };
        let id = session.ok_or_else(unauthorized)?.user().id.to_string();

        self.data
            .lock()
            .get(&Resource::Users)
            .and_then(|users| users.iter().find(|u| u.text("id").as_deref() == Some(id.as_str())))
            .map(|user| vec![user.clone()])
            .ok_or_else(|| FetchError::Status {
                resource: resource.path().to_string(),
                status: 404,
            })
    }

    fn network_error(resource: &str) -> FetchError {
        FetchError::Network {
            resource: resource.to_string(),
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl ResourceSource for MockSource {
    async fn fetch(
        &self,
        resource: Resource,
        session: Option<&Session>,
    ) -> FetchResult<Vec<Record>> {
        self.fetches
            .lock()
            .push((resource, session.map(|s| s.token().to_string())));

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.should_fail.lock() {
            return Err(Self::network_error(resource.path()));
        }
        if session.is_some() && *self.reject_tokens.lock() {
            return Err(FetchError::Unauthorized {
                resource: resource.path().to_string(),
                status: 401,
            });
        }
        if let Some(error) = self.failures.lock().get(&resource) {
            return Err(error.clone());
        }

        if resource.is_single() {
            return self.own_user(resource, session);
        }
        Ok(self.data.lock().get(&resource).cloned().unwrap_or_default())
    }

    async fn login(&self, request: &LoginRequest) -> FetchResult<LoginResponse> {
        if *self.should_fail.lock() {
            return Err(Self::network_error("login"));
        }

        let accounts = self.accounts.lock();
        let account = accounts
            .iter()
            .find(|a| a.email == request.email && a.password == request.password);

        match account {
            Some(account) => Ok(LoginResponse {
                token: account.token.clone(),
                user: account.profile.clone(),
            }),
            None => Err(FetchError::LoginRejected {
                status: 401,
                message: "Invalid credentials".to_string(),
            }),
        }
    }

    async fn post_action(&self, action: Action, session: Option<&Session>) -> FetchResult<()> {
        if *self.should_fail.lock() {
            return Err(Self::network_error(action.path()));
        }
        if session.is_none() || *self.reject_tokens.lock() {
            return Err(FetchError::Unauthorized {
                resource: action.path().to_string(),
                status: 401,
            });
        }

        self.actions.lock().push(action);
        match action {
            Action::MarkAllNotificationsRead => {
                let mut data = self.data.lock();
                if let Some(feed) = data.get_mut(&Resource::Notifications) {
                    let rows: Vec<Record> = feed
                        .drain(..)
                        .map(|r| {
                            let mut fields = r.fields().clone();
                            fields.insert("read".to_string(), Value::Bool(true));
                            Record::new(fields)
                        })
                        .collect();
                    *feed = rows;
                }
            }
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::{Role, UserId};
    use serde_json::json;

    fn session() -> Session {
        Session::new("tok", UserProfile::new(UserId::Number(1), Role::User))
    }

    #[tokio::test]
    async fn test_mock_source_serves_records() {
        let mock = MockSource::new();
        mock.set_records(Resource::Alerts, vec![json!({ "id": 1 }), json!({ "id": 2 })]);

        let rows = mock.fetch(Resource::Alerts, Some(&session())).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(mock.tokens_seen(), vec![Some("tok".to_string())]);

        let empty = mock.fetch(Resource::Incidents, None).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_mock_source_failure_mode() {
        let mock = MockSource::new();
        mock.set_should_fail(true);

        let result = mock.fetch(Resource::Alerts, None).await;
        assert!(matches!(result, Err(FetchError::Network { .. })));
        assert!(!mock.is_healthy());
    }

    #[tokio::test]
    async fn test_mock_mark_all_read() {
        let mock = MockSource::new();
        mock.set_records(
            Resource::Notifications,
            vec![json!({ "title": "a", "read": false }), json!({ "title": "b" })],
        );

        mock.post_action(Action::MarkAllNotificationsRead, Some(&session()))
            .await
            .unwrap();
        let rows = mock.fetch(Resource::Notifications, None).await.unwrap();
        assert!(rows.iter().all(|r| r.flag("read")));
        assert_eq!(mock.actions(), vec![Action::MarkAllNotificationsRead]);
    }
}

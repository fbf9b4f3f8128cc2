//! Front-end operations over one collection.
//!
//! Mirrors `SessionService`: busy while a call is in flight, one backend
//! call per operation, success and failure notified. Mutation failures for
//! most collections end up in `HookOutcome::Failure`; collections with
//! `PROPAGATES_ERRORS` notify and then hand the error back as `Err`.

use std::marker::PhantomData;

use tracing::{error, info};

use crate::api::{ApiClient, ApiError, ListQuery, Page};
use crate::effects::{Effects, Level};
use crate::hooks::{BusyFlag, HookOutcome};
use crate::i18n::Message;

use super::Resource;

pub struct ResourceService<R: Resource> {
    api: ApiClient,
    effects: Effects,
    busy: BusyFlag,
    _resource: PhantomData<R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            effects: self.effects.clone(),
            busy: self.busy.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(api: ApiClient, effects: Effects) -> Self {
        Self {
            api,
            effects,
            busy: BusyFlag::new(),
            _resource: PhantomData,
        }
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    fn notify_failure(&self, operation: &str, err: &ApiError) -> String {
        error!(resource = %R::KIND, operation = operation, error = %err, "Resource operation failed");
        let message = err.user_message(self.api.store().language());
        if !err.is_notified() {
            self.effects.notify(Level::Error, message.clone());
        }
        message
    }

    /// Notify, then either fold the error into the outcome or return it.
    fn mutation_failure<T>(&self, operation: &str, err: ApiError) -> Result<HookOutcome<T>, ApiError> {
        let message = self.notify_failure(operation, &err);
        if R::PROPAGATES_ERRORS {
            return Err(err);
        }
        Ok(HookOutcome::Failure {
            status: err.status(),
            message,
        })
    }

    fn notify_success(&self, backend_message: Option<String>, fallback: Message) {
        let language = self.api.store().language();
        let text = backend_message.unwrap_or_else(|| fallback.text(language).to_string());
        self.effects.notify(Level::Success, text);
    }

    pub async fn list(&self, query: &ListQuery) -> HookOutcome<Page<R::Item>> {
        let _busy = self.busy.enter();
        match self.api.list::<R>(query).await {
            Ok(page) => HookOutcome::Success {
                status: 200,
                value: page,
            },
            Err(e) => {
                let message = self.notify_failure("list", &e);
                HookOutcome::Failure {
                    status: e.status(),
                    message,
                }
            }
        }
    }

    pub async fn get(&self, id: i64) -> HookOutcome<R::Item> {
        let _busy = self.busy.enter();
        match self.api.get::<R>(id).await {
            Ok(item) => HookOutcome::Success {
                status: 200,
                value: item,
            },
            Err(e) => {
                let message = self.notify_failure("get", &e);
                HookOutcome::Failure {
                    status: e.status(),
                    message,
                }
            }
        }
    }

    pub async fn create(&self, payload: &R::Payload) -> Result<HookOutcome<R::Item>, ApiError> {
        let _busy = self.busy.enter();
        match self.api.create::<R>(payload).await {
            Ok(mutation) => {
                info!(resource = %R::KIND, status = mutation.status, "Record created");
                self.notify_success(mutation.message, Message::Saved);
                Ok(HookOutcome::Success {
                    status: mutation.status,
                    value: mutation.data,
                })
            }
            Err(e) => self.mutation_failure("create", e),
        }
    }

    pub async fn update(&self, id: i64, payload: &R::Payload) -> Result<HookOutcome<R::Item>, ApiError> {
        let _busy = self.busy.enter();
        match self.api.update::<R>(id, payload).await {
            Ok(mutation) => {
                info!(resource = %R::KIND, id = id, status = mutation.status, "Record updated");
                self.notify_success(mutation.message, Message::Saved);
                Ok(HookOutcome::Success {
                    status: mutation.status,
                    value: mutation.data,
                })
            }
            Err(e) => self.mutation_failure("update", e),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<HookOutcome<()>, ApiError> {
        let _busy = self.busy.enter();
        match self.api.delete::<R>(id).await {
            Ok(ack) => {
                info!(resource = %R::KIND, id = id, "Record deleted");
                self.notify_success(ack.message, Message::Deleted);
                Ok(HookOutcome::Success {
                    status: ack.status,
                    value: (),
                })
            }
            Err(e) => self.mutation_failure("delete", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientSettings;
    use crate::auth::Role;
    use crate::auth::CredentialStore;
    use crate::effects::recording;
    use crate::models::{ClientPayload, UserPayload};
    use crate::resources::{Clients, Users};

    // Port 9 refuses connections, so every call fails with a network error.
    fn unreachable() -> ApiClient {
        let settings = ClientSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ClientSettings::default()
        };
        ApiClient::new(settings, CredentialStore::in_memory(), Effects::logging()).unwrap()
    }

    #[tokio::test]
    async fn test_failure_folded_into_outcome() {
        let (effects, notifier, _) = recording();
        let service = ResourceService::<Clients>::new(unreachable(), effects);

        let outcome = service.create(&ClientPayload::default()).await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.status(), None);
        assert_eq!(notifier.errors().len(), 1);
        assert!(!service.busy().is_busy());
    }

    #[tokio::test]
    async fn test_failure_propagated_after_notifying() {
        let (effects, notifier, _) = recording();
        let service = ResourceService::<Users>::new(unreachable(), effects);

        let payload = UserPayload {
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            email: "ana@negobi.com".to_string(),
            role: Role::Sales,
            company_id: Some(1),
            password: Some("secreto".to_string()),
        };
        let result = service.create(&payload).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(notifier.errors().len(), 1);
        assert!(!service.busy().is_busy());
    }
}

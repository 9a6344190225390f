//! Token orchestration
//!
//! A token create waits until its service account is readable. The secret
//! comes back only in the create response; it is stamped into state then and
//! survives every later refresh.

use std::sync::Arc;

use async_trait::async_trait;
use permsys_common::OperationContext;
use permsys_domain::{ApiResult, Diagnostics, ETag, Entity, Lifecycle, ScopeId, Token};
use tracing::{instrument, warn};

use super::{record, refuse, transition, Coordinator, ResourceOrchestrator};
use crate::existence::{ExistenceProbe, ServiceAccountProbe};
use crate::plan;
use crate::ports::{ServiceAccountApi, TokenApi};
use crate::validation::Validate;

/// Lifecycle of service account tokens.
pub struct TokenOrchestrator {
    tokens: Arc<dyn TokenApi>,
    accounts: Arc<dyn ServiceAccountApi>,
    coordinator: Coordinator,
}

impl TokenOrchestrator {
    pub fn new(
        tokens: Arc<dyn TokenApi>,
        accounts: Arc<dyn ServiceAccountApi>,
        coordinator: Coordinator,
    ) -> Self {
        Self { tokens, accounts, coordinator }
    }

    /// Tokens owned by one service account.
    pub async fn list(
        &self,
        ctx: &OperationContext,
        scope: &ScopeId,
        service_account_id: &str,
        diags: &mut Diagnostics,
    ) -> ApiResult<Vec<Token>> {
        let tokens = self
            .coordinator
            .read(ctx, diags, "list tokens", self.tokens.list_tokens(scope, service_account_id))
            .await?;
        Ok(tokens.unwrap_or_default())
    }
}

#[async_trait]
impl ResourceOrchestrator for TokenOrchestrator {
    type Entity = Token;

    #[instrument(
        skip_all,
        fields(scope = %planned.meta.scope_id, service_account = %planned.service_account_id, name = %planned.meta.name)
    )]
    async fn create(
        &self,
        ctx: &OperationContext,
        mut planned: Token,
        diags: &mut Diagnostics,
    ) -> ApiResult<Token> {
        record(diags, "create token", planned.validate())?;
        let scope = planned.scope().clone();
        let account_id = planned.service_account_id.clone();

        let parents: Vec<Box<dyn ExistenceProbe>> = vec![Box::new(ServiceAccountProbe::new(
            Arc::clone(&self.accounts),
            scope.clone(),
            account_id.clone(),
        ))];
        self.coordinator.wait_for_parents(ctx, diags, "create token", &parents).await?;

        transition(Token::KIND, &planned.meta.name, Lifecycle::Absent, Lifecycle::Creating);
        let request = planned.clone();
        let created = self
            .coordinator
            .create(ctx, diags, "create token", &scope, || self.tokens.create_token(&request))
            .await;
        let created = match created {
            Ok(bundle) => bundle.into_entity(),
            Err(err) => {
                transition(
                    Token::KIND,
                    &planned.meta.name,
                    Lifecycle::Creating,
                    Lifecycle::Creating.on_failure(),
                );
                return Err(err);
            }
        };

        planned.meta.stamp_created(&created.meta);
        planned.hash = created.hash;
        planned.secret = created.secret;
        if !planned.has_secret() {
            warn!(id = planned.id(), "token created without a plain-text secret");
            diags.warning(
                format!("token {} was created without a secret", planned.id()),
                "the API did not return the plain-text value; it cannot be retrieved later",
            );
        }
        transition(Token::KIND, planned.id(), Lifecycle::Creating, Lifecycle::Present);

        let id = planned.id().to_string();
        self.coordinator
            .confirm_created(ctx, diags, &format!("token {id}"), || async {
                self.tokens.get_token(&scope, &account_id, &id).await.map(|_| true)
            })
            .await;
        Ok(planned)
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn read(
        &self,
        ctx: &OperationContext,
        mut state: Token,
        diags: &mut Diagnostics,
    ) -> ApiResult<Option<Token>> {
        record(diags, "read token", state.validate_stored())?;
        let remote = self
            .coordinator
            .read(
                ctx,
                diags,
                "read token",
                self.tokens.get_token(state.scope(), &state.service_account_id, state.id()),
            )
            .await?;
        Ok(remote.map(|bundle| {
            state.refresh_from(bundle.into_entity());
            state
        }))
    }

    #[instrument(skip_all, fields(scope = %prior.meta.scope_id, id = %prior.meta.id))]
    async fn update(
        &self,
        ctx: &OperationContext,
        prior: Token,
        mut planned: Token,
        diags: &mut Diagnostics,
    ) -> ApiResult<Token> {
        plan::reuse_computed(&prior, &mut planned);
        record(diags, "update token", prior.validate_stored())?;
        record(diags, "update token", planned.validate())?;
        if plan::token_requires_replace(&prior, &planned) {
            return refuse(
                diags,
                "update token",
                "moving a token to another service account or permission system requires \
                 replacement"
                    .into(),
            );
        }
        // the secret is never re-derivable; carry it forward
        if !planned.has_secret() {
            planned.secret = prior.secret.clone();
        }
        if planned.hash.is_none() {
            planned.hash = prior.hash.clone();
        }
        if !plan::token_changed(&prior, &planned) {
            return Ok(prior);
        }

        transition(Token::KIND, prior.id(), Lifecycle::Present, Lifecycle::Updating);
        let scope = prior.scope().clone();
        let account_id = prior.service_account_id.clone();
        let id = prior.id().to_string();
        let request = planned.clone();
        let tokens = &self.tokens;

        let updated = self
            .coordinator
            .update(
                ctx,
                diags,
                "update token",
                &scope,
                prior.etag().clone(),
                || async { tokens.get_token(&scope, &account_id, &id).await.map(|b| b.etag) },
                |etag: ETag| {
                    let request = &request;
                    async move { tokens.update_token(request, &etag).await }
                },
            )
            .await;

        match updated {
            Ok(bundle) => {
                planned.refresh_from(bundle.into_entity());
                transition(Token::KIND, planned.id(), Lifecycle::Updating, Lifecycle::Present);
                Ok(planned)
            }
            Err(err) => {
                transition(
                    Token::KIND,
                    prior.id(),
                    Lifecycle::Updating,
                    Lifecycle::Updating.on_failure(),
                );
                Err(err)
            }
        }
    }

    #[instrument(skip_all, fields(scope = %state.meta.scope_id, id = %state.meta.id))]
    async fn delete(
        &self,
        ctx: &OperationContext,
        state: &Token,
        diags: &mut Diagnostics,
    ) -> ApiResult<()> {
        record(diags, "delete token", state.validate_stored())?;
        transition(Token::KIND, state.id(), Lifecycle::Present, Lifecycle::Deleting);
        let result = self
            .coordinator
            .delete(ctx, diags, "delete token", state.scope(), || {
                self.tokens.delete_token(state.scope(), &state.service_account_id, state.id())
            })
            .await;
        let next =
            if result.is_ok() { Lifecycle::Absent } else { Lifecycle::Deleting.on_failure() };
        transition(Token::KIND, state.id(), Lifecycle::Deleting, next);
        result
    }
}

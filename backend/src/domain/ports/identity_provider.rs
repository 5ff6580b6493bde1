//! Port producing the caller's validated identity.
//!
//! Token verification belongs to the adapter behind this port; the engine only
//! consumes the resulting tenant database and ids.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::define_port_error;
use crate::domain::{DatabaseName, EngineRequest};

/// Identity of the caller as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Tenant database for `TENANT`-scoped calls, when the caller has one.
    pub tenant_database: Option<DatabaseName>,
    pub user_id: String,
    pub session_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            tenant_database: None,
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn with_tenant_database(mut self, database: DatabaseName) -> Self {
        self.tenant_database = Some(database);
        self
    }
}

define_port_error! {
    /// Failures raised while establishing identity.
    pub enum IdentityError {
        /// No credential was presented.
        MissingToken => "Token missing",
        /// A credential was presented but rejected.
        Rejected { message: String } => "{message}",
    }
}

/// Resolves a request into an [`Identity`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the request is anonymous and allowed to proceed.
    async fn identify(&self, request: &EngineRequest) -> Result<Option<Identity>, IdentityError>;
}

/// Procedures callable without a token when tokens are required.
pub const DEFAULT_PUBLIC_PROCEDURES: &[&str] = &["auth.login"];

/// Identity provider that trusts the claims carried in the request's `auth`
/// block.
///
/// Suitable behind a gateway that has already verified the token. The session
/// id is a fingerprint of the token so raw credentials never reach logs.
///
/// When tokens are required, the procedures in the public list (login by
/// default) still pass without one.
///
/// # Examples
/// ```
/// use hybrid_engine::domain::ports::RequestClaimsIdentityProvider;
///
/// let provider = RequestClaimsIdentityProvider::new(true)
///     .with_public_procedures(["auth.login", "auth.forgotPassword"]);
/// assert!(provider.is_public("auth.forgotPassword"));
/// assert!(!provider.is_public("GetOrders"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestClaimsIdentityProvider {
    require_token: bool,
    public_procedures: BTreeSet<String>,
}

impl Default for RequestClaimsIdentityProvider {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RequestClaimsIdentityProvider {
    /// Provider with the [`DEFAULT_PUBLIC_PROCEDURES`].
    pub fn new(require_token: bool) -> Self {
        Self {
            require_token,
            public_procedures: DEFAULT_PUBLIC_PROCEDURES
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }

    /// Replace the public procedure list.
    #[must_use]
    pub fn with_public_procedures<I, P>(mut self, procedures: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.public_procedures = procedures.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `procedure` may be called without a token.
    pub fn is_public(&self, procedure: &str) -> bool {
        self.public_procedures.contains(procedure.trim())
    }

    fn token_required(&self, request: &EngineRequest) -> bool {
        self.require_token && !request.procedure().is_some_and(|name| self.is_public(name))
    }
}

const ANONYMOUS_USER: &str = "anonymous";

fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

#[async_trait]
impl IdentityProvider for RequestClaimsIdentityProvider {
    async fn identify(&self, request: &EngineRequest) -> Result<Option<Identity>, IdentityError> {
        let token_required = self.token_required(request);
        let Some(auth) = request.auth.as_ref() else {
            return if token_required {
                Err(IdentityError::missing_token())
            } else {
                Ok(None)
            };
        };

        let token = auth.token.as_deref().map(str::trim).filter(|t| !t.is_empty());
        if token_required && token.is_none() {
            return Err(IdentityError::missing_token());
        }

        let tenant_database = auth
            .company_db
            .as_deref()
            .map(str::trim)
            .filter(|db| !db.is_empty())
            .map(DatabaseName::new)
            .transpose()
            .map_err(|err| IdentityError::rejected(format!("auth.companyDb {err}")))?;

        let user_id = auth
            .user_id
            .clone()
            .unwrap_or_else(|| ANONYMOUS_USER.to_owned());
        let session_id = token.map(fingerprint).unwrap_or_default();

        Ok(Some(Identity {
            tenant_database,
            user_id,
            session_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Claims-based identity resolution.
    use super::*;
    use crate::domain::{RequestAction, RequestAuth};
    use rstest::rstest;

    fn request_with(auth: Option<RequestAuth>) -> EngineRequest {
        EngineRequest {
            auth,
            ..EngineRequest::default()
        }
    }

    fn calling(procedure: &str, token: Option<&str>) -> EngineRequest {
        EngineRequest {
            action: Some(RequestAction {
                procedure: procedure.to_owned(),
                ..RequestAction::default()
            }),
            auth: token.map(|token| RequestAuth {
                token: Some(token.to_owned()),
                ..RequestAuth::default()
            }),
            ..EngineRequest::default()
        }
    }

    #[rstest]
    #[tokio::test]
    async fn company_db_becomes_the_tenant_database() {
        let provider = RequestClaimsIdentityProvider::default();
        let request = request_with(Some(RequestAuth {
            token: Some("abc".into()),
            company_db: Some("ClientA_DB".into()),
            user_id: Some("42".into()),
        }));

        let identity = provider
            .identify(&request)
            .await
            .expect("identify")
            .expect("identity present");

        assert_eq!(
            identity.tenant_database.as_ref().map(DatabaseName::as_str),
            Some("ClientA_DB")
        );
        assert_eq!(identity.user_id, "42");
        assert_eq!(identity.session_id.len(), 16);
        assert_ne!(identity.session_id, "abc");
    }

    #[rstest]
    #[tokio::test]
    async fn anonymous_requests_pass_when_tokens_are_optional() {
        let provider = RequestClaimsIdentityProvider::default();
        let identity = provider
            .identify(&request_with(None))
            .await
            .expect("identify");
        assert!(identity.is_none());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(RequestAuth { token: Some("  ".into()), ..RequestAuth::default() }))]
    #[tokio::test]
    async fn missing_tokens_are_rejected_when_required(#[case] auth: Option<RequestAuth>) {
        let provider = RequestClaimsIdentityProvider::new(true);
        let error = provider
            .identify(&request_with(auth))
            .await
            .expect_err("token required");
        assert_eq!(error, IdentityError::MissingToken);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_company_db_is_ignored() {
        let provider = RequestClaimsIdentityProvider::default();
        let request = request_with(Some(RequestAuth {
            company_db: Some("   ".into()),
            ..RequestAuth::default()
        }));
        let identity = provider
            .identify(&request)
            .await
            .expect("identify")
            .expect("identity present");
        assert!(identity.tenant_database.is_none());
        assert_eq!(identity.user_id, ANONYMOUS_USER);
    }

    #[rstest]
    #[case("auth.login", None, true)]
    #[case("auth.login", Some("abc"), true)]
    #[case("GetOrders", None, false)]
    #[case("GetOrders", Some("abc"), true)]
    #[case(" auth.login ", None, true)]
    #[tokio::test]
    async fn public_procedures_skip_the_token_requirement(
        #[case] procedure: &str,
        #[case] token: Option<&str>,
        #[case] allowed: bool,
    ) {
        let provider = RequestClaimsIdentityProvider::new(true);

        let outcome = provider.identify(&calling(procedure, token)).await;

        assert_eq!(outcome.is_ok(), allowed, "{outcome:?}");
        if !allowed {
            assert_eq!(outcome, Err(IdentityError::MissingToken));
        }
    }

    #[rstest]
    #[tokio::test]
    async fn public_list_can_be_replaced() {
        let provider = RequestClaimsIdentityProvider::new(true)
            .with_public_procedures(["auth.forgotPassword"]);

        assert!(provider.identify(&calling("auth.forgotPassword", None)).await.is_ok());
        assert_eq!(
            provider.identify(&calling("auth.login", None)).await,
            Err(IdentityError::MissingToken)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn public_list_is_ignored_when_tokens_are_optional() {
        let provider = RequestClaimsIdentityProvider::new(false)
            .with_public_procedures(Vec::<String>::new());
        assert_eq!(provider.identify(&calling("GetOrders", None)).await, Ok(None));
    }
}

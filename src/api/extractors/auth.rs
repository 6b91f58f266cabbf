use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, Method},
};
use crate::state::AppState;
use crate::error::AppError;
use crate::domain::models::auth::Claims;
use crate::domain::models::user::{Identity, Role};
use crate::domain::services::auth_service::ACCESS_TOKEN_AUDIENCE;
use std::marker::PhantomData;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{warn, Span};

/// Any signed-in user. Mutating requests must echo the CSRF token from the
/// access token in `X-CSRF-Token`.
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(AppError::InternalWithMsg("CookieManagerLayer is not installed".into()))?;

        let access_token = cookies.get("access_token")
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid JWT public key PEM: {}", e)))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
        validation.set_issuer(&[&app_state.config.auth_issuer]);

        let token_data = decode::<Claims>(&access_token, &decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized)?;

        let method = &parts.method;
        if method != Method::GET && method != Method::HEAD && method != Method::OPTIONS {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .and_then(|v| v.to_str().ok())
                .ok_or(AppError::Forbidden("Missing CSRF token".into()))?;

            if csrf_header_val != token_data.claims.csrf_token {
                return Err(AppError::Forbidden("Invalid CSRF token".into()));
            }
        }

        let identity = Identity {
            user_id: token_data.claims.sub,
            role: token_data.claims.role,
        };

        Span::current().record("user_id", &identity.user_id);

        Ok(AuthUser(identity))
    }
}

/// The set of roles allowed through an [`Authorized`] extractor.
pub trait Capability {
    const ROLES: &'static [Role];
}

pub struct ClientOnly;
pub struct MasterOnly;
pub struct AdminOnly;
pub struct MasterOrAdmin;
pub struct ClientOrMaster;

impl Capability for ClientOnly {
    const ROLES: &'static [Role] = &[Role::Client];
}

impl Capability for MasterOnly {
    const ROLES: &'static [Role] = &[Role::Master];
}

impl Capability for AdminOnly {
    const ROLES: &'static [Role] = &[Role::Admin];
}

impl Capability for MasterOrAdmin {
    const ROLES: &'static [Role] = &[Role::Master, Role::Admin];
}

impl Capability for ClientOrMaster {
    const ROLES: &'static [Role] = &[Role::Client, Role::Master];
}

/// A signed-in user whose role is one of `C::ROLES`; anyone else gets 403.
pub struct Authorized<C>(pub Identity, pub PhantomData<C>);

impl<S, C> FromRequestParts<S> for Authorized<C>
where
    S: Send + Sync,
    C: Capability,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;

        if !C::ROLES.contains(&identity.role) {
            warn!("Role {} denied on {} {}", identity.role, parts.method, parts.uri.path());
            return Err(AppError::Forbidden("Insufficient permissions".into()));
        }

        Ok(Authorized(identity, PhantomData))
    }
}

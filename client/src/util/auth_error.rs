//! User-facing copy for auth error codes.

#[cfg(test)]
#[path = "auth_error_test.rs"]
mod auth_error_test;

use session::{ErrorCode, RedirectIntent};

/// What the sign-in page shows for an `error` query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorNotice {
    pub code: ErrorCode,
    pub message: &'static str,
    /// Decoded path to go back to, when the URL carried a safe `redirect`.
    pub retry_target: Option<String>,
}

#[must_use]
pub fn message_for(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::SessionExpired => "Sua sessão expirou. Faça login novamente para continuar.",
        ErrorCode::AccessDenied => "Acesso negado. Você não tem permissão para acessar esta página.",
        ErrorCode::InvalidCredentials => "E-mail ou senha inválidos.",
        ErrorCode::EmailNotConfirmed => "Seu e-mail ainda não foi confirmado. Verifique sua caixa de entrada.",
        ErrorCode::Default => "Ocorreu um erro de autenticação. Tente novamente.",
    }
}

/// Build the notice for already-decoded `error` and `redirect` values.
/// No `error` means nothing to show.
#[must_use]
pub fn present(error: Option<&str>, redirect: Option<&str>) -> Option<ErrorNotice> {
    let code = ErrorCode::from_param(error?);
    let retry_target = RedirectIntent::from_params(redirect, None).map(|intent| intent.target_path);
    Some(ErrorNotice { code, message: message_for(code), retry_target })
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS authentication

use md5::compute as md5_compute;

use super::RouterOsConnection;
use crate::config::LoginMethod;
use crate::error::{ClientError, Result};

impl RouterOsConnection {
    pub(crate) async fn login(
        &self,
        username: &str,
        password: &str,
        method: LoginMethod,
    ) -> Result<()> {
        tracing::trace!("Attempting login for user: {}", username);
        if method == LoginMethod::Plain {
            return self.plain_login(username, password).await;
        }

        // Legacy challenge-response method (pre-6.43)
        tracing::trace!("Requesting challenge for legacy login");
        let reply = self.request(&["/login"]).await.map_err(into_auth_error)?;
        let challenge_hex = reply
            .done
            .get("ret")
            .or_else(|| reply.rows.iter().find_map(|row| row.get("ret")));

        let Some(challenge_hex) = challenge_hex else {
            if method == LoginMethod::Auto {
                tracing::debug!("No challenge received, falling back to plain login");
                return self.plain_login(username, password).await;
            }
            return Err(ClientError::Authentication(
                "No challenge 'ret' received".to_string(),
            ));
        };
        tracing::trace!("Challenge received, length: {}", challenge_hex.len());
        let response = challenge_response(password, challenge_hex)?;

        self.request(&[
            "/login".to_string(),
            format!("=name={username}"),
            format!("=response={response}"),
        ])
        .await
        .map_err(into_auth_error)?;
        tracing::debug!("Login successful (legacy method)");
        Ok(())
    }

    /// Plain credentials login (RouterOS 6.43+)
    async fn plain_login(&self, username: &str, password: &str) -> Result<()> {
        self.request(&[
            "/login".to_string(),
            format!("=name={username}"),
            format!("=password={password}"),
        ])
        .await
        .map_err(into_auth_error)?;
        tracing::debug!("Login successful (plain method)");
        Ok(())
    }
}

/// `00` followed by hex `md5(0x00 || password || challenge)`
pub(crate) fn challenge_response(password: &str, challenge_hex: &str) -> Result<String> {
    let challenge = hex::decode(challenge_hex)
        .map_err(|e| ClientError::Authentication(format!("Invalid challenge: {e}")))?;

    let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
    data.push(0u8);
    data.extend_from_slice(password.as_bytes());
    data.extend_from_slice(&challenge);
    let digest = md5_compute(&data);

    let mut response = String::from("00");
    response.push_str(&hex::encode(digest.0));
    Ok(response)
}

fn into_auth_error(err: ClientError) -> ClientError {
    match err {
        ClientError::Trap { message } => ClientError::Authentication(message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_response_layout() {
        let response =
            challenge_response("secret", "ab12cd34ef56ab12cd34ef56ab12cd34").unwrap();
        assert!(response.starts_with("00"));
        assert_eq!(response.len(), 2 + 32);
        assert!(response.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_challenge_response_hashes_raw_challenge() {
        let challenge = [0x01u8, 0x02, 0xfe];
        let mut data = vec![0u8];
        data.extend_from_slice(b"pw");
        data.extend_from_slice(&challenge);
        let expected = format!("00{}", hex::encode(md5::compute(&data).0));

        assert_eq!(challenge_response("pw", "0102fe").unwrap(), expected);
    }

    #[test]
    fn test_challenge_response_depends_on_password() {
        let a = challenge_response("one", "00ff").unwrap();
        let b = challenge_response("two", "00ff").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_challenge_response_rejects_bad_hex() {
        let err = challenge_response("pw", "zz").unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
    }

    #[test]
    fn test_trap_becomes_auth_error() {
        let err = into_auth_error(ClientError::Trap {
            message: "invalid user name or password (6)".to_string(),
        });
        assert!(matches!(err, ClientError::Authentication(m) if m.contains("invalid")));
        assert!(matches!(
            into_auth_error(ClientError::Timeout { tag: 1 }),
            ClientError::Timeout { .. }
        ));
    }
}

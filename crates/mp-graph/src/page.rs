//! Facebook Page endpoints

use mp_core::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::client::{string_field, GraphClient};
use crate::error::{GraphError, Result};

#[derive(Debug, Deserialize)]
struct PageLookupResponse {
    instagram_business_account: Option<LinkedAccount>,
}

#[derive(Debug, Deserialize)]
struct LinkedAccount {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    post_id: Option<String>,
    id: Option<String>,
}

impl GraphClient {
    /// Exchange the system user token for a Page access token
    pub async fn page_access_token(
        &self,
        page_id: &str,
        system_token: &SecretString,
    ) -> Result<SecretString> {
        let json = self
            .get(
                page_id,
                &[
                    ("fields", "access_token"),
                    ("access_token", system_token.expose()),
                ],
                &["access_token"],
            )
            .await?;

        let token = string_field(&json, "access_token")?;
        debug!("Obtained Page access token for {}", page_id);
        Ok(SecretString::new(token))
    }

    /// Instagram business account linked to the Page, if any
    pub async fn instagram_business_account(
        &self,
        page_id: &str,
        page_token: &SecretString,
    ) -> Result<Option<String>> {
        let json = self
            .get(
                page_id,
                &[
                    ("fields", "instagram_business_account"),
                    ("access_token", page_token.expose()),
                ],
                &[],
            )
            .await?;

        let lookup: PageLookupResponse = serde_json::from_value(json)?;
        Ok(lookup
            .instagram_business_account
            .and_then(|account| account.id)
            .filter(|id| !id.is_empty()))
    }

    /// Publish a text post to the Page feed, returning the post id
    pub async fn post_text(
        &self,
        page_id: &str,
        message: &str,
        page_token: &SecretString,
    ) -> Result<String> {
        let json = self
            .post(
                &format!("{}/feed", page_id),
                &[("message", message), ("access_token", page_token.expose())],
                &["id"],
            )
            .await?;

        let id = string_field(&json, "id")?;
        debug!("Feed post response id: {}", id);
        Ok(id)
    }

    /// Publish a photo post to the Page, returning `post_id` (or `id`)
    pub async fn post_photo(
        &self,
        page_id: &str,
        image_url: &str,
        caption: &str,
        page_token: &SecretString,
    ) -> Result<String> {
        let json = self
            .post(
                &format!("{}/photos", page_id),
                &[
                    ("url", image_url),
                    ("caption", caption),
                    ("access_token", page_token.expose()),
                ],
                &[],
            )
            .await?;

        let photo: PhotoResponse = serde_json::from_value(json.clone())?;
        let id = photo
            .post_id
            .filter(|id| !id.is_empty())
            .or_else(|| photo.id.filter(|id| !id.is_empty()))
            .ok_or_else(|| GraphError::MissingField {
                field: "post_id".to_string(),
                body: json.to_string(),
            })?;

        debug!("Photo post response id: {}", id);
        Ok(id)
    }
}

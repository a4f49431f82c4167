//! Instagram content publishing endpoints
//!
//! Publishing is two calls: create a media container from a public image
//! URL, then publish the container by its creation id.

use mp_core::SecretString;
use tracing::debug;

use crate::client::{string_field, GraphClient};
use crate::error::Result;

impl GraphClient {
    /// Create a media container, returning its creation id
    pub async fn create_media_container(
        &self,
        ig_user_id: &str,
        image_url: &str,
        caption: &str,
        page_token: &SecretString,
    ) -> Result<String> {
        let json = self
            .post(
                &format!("{}/media", ig_user_id),
                &[
                    ("image_url", image_url),
                    ("caption", caption),
                    ("access_token", page_token.expose()),
                ],
                &["id"],
            )
            .await?;

        let creation_id = string_field(&json, "id")?;
        debug!("Media container response id: {}", creation_id);
        Ok(creation_id)
    }

    /// Publish a previously created container, returning the media id
    pub async fn publish_media_container(
        &self,
        ig_user_id: &str,
        creation_id: &str,
        page_token: &SecretString,
    ) -> Result<String> {
        let json = self
            .post(
                &format!("{}/media_publish", ig_user_id),
                &[
                    ("creation_id", creation_id),
                    ("access_token", page_token.expose()),
                ],
                &["id"],
            )
            .await?;

        let media_id = string_field(&json, "id")?;
        debug!("Media publish response id: {}", media_id);
        Ok(media_id)
    }
}

//! Tesseract OCR over a Tweet's attached photos. Compiled only with the
//! `ocr` feature; a failed download or recognition contributes nothing.

use anyhow::{anyhow, Context, Result};
use tracing::warn;

use crate::platform::Media;

/// Download every attached photo and concatenate the recognized text,
/// one newline-terminated block per image. Per-image failures are
/// logged and skipped; the result may be empty.
pub async fn extract_media_text(client: &reqwest::Client, media: &[Media]) -> String {
    concat_recognized(photo_urls(media), |url| {
        let client = client.clone();
        async move { recognize(&client, &url).await }
    })
    .await
}

/// Only "photo" media items are OCR candidates; everything else is skipped.
fn photo_urls(media: &[Media]) -> Vec<String> {
    media
        .iter()
        .filter(|item| item.kind == "photo")
        .map(|item| item.url.clone())
        .collect()
}

async fn concat_recognized<F, Fut>(urls: Vec<String>, recognize: F) -> String
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = Result<String>>,
{
    let mut out = String::new();
    for url in urls {
        match recognize(url.clone()).await {
            Ok(text) => {
                out.push_str(&text);
                out.push('\n');
            }
            Err(e) => warn!("OCR failed for {}: {:#}", url, e),
        }
    }
    out
}

async fn recognize(client: &reqwest::Client, url: &str) -> Result<String> {
    let bytes = client
        .get(url)
        .send()
        .await
        .context("Image download failed")?
        .error_for_status()
        .context("Image download failed")?
        .bytes()
        .await
        .context("Image download failed")?;

    let decoded = image::load_from_memory(&bytes).context("Image decode failed")?;
    let tess_image = rusty_tesseract::Image::from_dynamic_image(&decoded)
        .map_err(|e| anyhow!("Tesseract rejected the image: {}", e))?;
    rusty_tesseract::image_to_string(&tess_image, &rusty_tesseract::Args::default())
        .map_err(|e| anyhow!("Tesseract recognition failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(kind: &str, url: &str) -> Media {
        Media {
            kind: kind.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_only_photos_selected() {
        let items = vec![
            media("photo", "https://pbs.twimg.com/1.jpg"),
            media("video", "https://pbs.twimg.com/2.mp4"),
            media("photo", "https://pbs.twimg.com/3.jpg"),
        ];

        assert_eq!(
            photo_urls(&items),
            vec![
                "https://pbs.twimg.com/1.jpg".to_string(),
                "https://pbs.twimg.com/3.jpg".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_rest() {
        let urls = vec!["bad".to_string(), "good".to_string()];
        let out = concat_recognized(urls, |url| async move {
            if url == "bad" {
                Err(anyhow!("download refused"))
            } else {
                Ok("recognized text".to_string())
            }
        })
        .await;

        assert_eq!(out, "recognized text\n");
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty() {
        let urls = vec!["a".to_string(), "b".to_string()];
        let out = concat_recognized(urls, |_| async { Err(anyhow!("no")) }).await;
        assert!(out.is_empty());
    }
}

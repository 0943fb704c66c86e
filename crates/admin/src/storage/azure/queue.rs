//! Queue service over REST.
//!
//! Message text is sent as-is inside the XML envelope (XML-escaped, not
//! base64), which is how the .NET and Python SDKs write by default. Replies
//! may carry numeric character references, which are decoded on receive.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};

use super::{AzureStorage, Service, encode_path, expect_created, expect_status};
use crate::storage::{Result, StorageError};
use crate::storage::queue::{QueueMessage, QueueService};

/// Decode entity and character references (`&amp;`, `&#xD;`, `&#10;`).
fn unescape_xml(text: &str) -> Result<String> {
    quick_xml::escape::unescape(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| StorageError::InvalidRecord(format!("queue message XML: {e}")))
}

/// Text content of the first `<tag>` element in `xml`.
fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = start + xml.get(start..)?.find(&close)?;
    xml.get(start..end)
}

/// The first message of a `QueueMessagesList` response, if any.
fn parse_first_message(xml: &str) -> Result<Option<QueueMessage>> {
    let Some(message) = element_text(xml, "QueueMessage") else {
        return Ok(None);
    };
    let (Some(id), Some(pop_receipt)) = (
        element_text(message, "MessageId"),
        element_text(message, "PopReceipt"),
    ) else {
        return Ok(None);
    };
    Ok(Some(QueueMessage {
        id: id.to_string(),
        pop_receipt: unescape_xml(pop_receipt)?,
        text: unescape_xml(element_text(message, "MessageText").unwrap_or_default())?,
    }))
}

#[async_trait]
impl QueueService for AzureStorage {
    async fn create_queue(&self, queue: &str) -> Result<()> {
        let url = self.url(Service::Queue, &encode_path(&[queue]), &[])?;
        let response = self
            .send(Service::Queue, self.request(Method::PUT, url))
            .await?;
        expect_created(response).await?;
        tracing::debug!(queue, "Queue ready");
        Ok(())
    }

    async fn put_message(&self, queue: &str, text: &str) -> Result<()> {
        let url = self.url(Service::Queue, &format!("{}/messages", encode_path(&[queue])), &[])?;
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><QueueMessage><MessageText>{}</MessageText></QueueMessage>",
            quick_xml::escape::escape(text)
        );
        let builder = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/xml")
            .body(body);

        let response = self.send(Service::Queue, builder).await?;
        expect_status(response, &[StatusCode::CREATED]).await?;
        Ok(())
    }

    async fn get_message(&self, queue: &str) -> Result<Option<QueueMessage>> {
        let url = self.url(
            Service::Queue,
            &format!("{}/messages", encode_path(&[queue])),
            &[("numofmessages", "1")],
        )?;
        let response = self
            .send(Service::Queue, self.request(Method::GET, url))
            .await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;
        let body = response.text().await?;
        parse_first_message(&body)
    }

    async fn delete_message(&self, queue: &str, message: &QueueMessage) -> Result<()> {
        let url = self.url(
            Service::Queue,
            &format!("{}/messages/{}", encode_path(&[queue]), encode_path(&[&message.id])),
            &[("popreceipt", message.pop_receipt.as_str())],
        )?;
        let response = self
            .send(Service::Queue, self.request(Method::DELETE, url))
            .await?;
        expect_status(response, &[StatusCode::NO_CONTENT]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trip() {
        let text = r#"{"ProductName":"Salt & <Pepper>"}"#;
        let escaped = quick_xml::escape::escape(text);
        assert!(!escaped.contains('<'));
        assert_eq!(unescape_xml(&escaped).unwrap(), text);
    }

    #[test]
    fn test_unescape_character_references() {
        assert_eq!(unescape_xml("line&#xD;&#10;end").unwrap(), "line\r\nend");
        assert_eq!(unescape_xml("&#60;&#x3E;&amp;lt;").unwrap(), "<>&lt;");
    }

    #[test]
    fn test_unescape_rejects_unknown_entity() {
        assert!(matches!(
            unescape_xml("&bogus;"),
            Err(StorageError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_parse_first_message() {
        let xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?><QueueMessagesList><QueueMessage>\
            <MessageId>5974b586-0df3-4e2d-ad0c-18e3892bfca2</MessageId>\
            <InsertionTime>Fri, 09 Oct 2009 21:04:30 GMT</InsertionTime>\
            <PopReceipt>YzQ4Yzg1MDI=</PopReceipt>\
            <DequeueCount>1</DequeueCount>\
            <MessageText>{&quot;NewStock&quot;:7}</MessageText>\
            </QueueMessage></QueueMessagesList>";

        let message = parse_first_message(xml).unwrap().unwrap();
        assert_eq!(message.id, "5974b586-0df3-4e2d-ad0c-18e3892bfca2");
        assert_eq!(message.pop_receipt, "YzQ4Yzg1MDI=");
        assert_eq!(message.text, r#"{"NewStock":7}"#);
    }

    #[test]
    fn test_parse_empty_list() {
        let xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?><QueueMessagesList></QueueMessagesList>";
        assert!(parse_first_message(xml).unwrap().is_none());
    }
}

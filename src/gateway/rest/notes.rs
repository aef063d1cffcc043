use async_trait::async_trait;
use serde_json::json;

use super::{send, send_for, RestBackend};
use crate::entity::{Note, NoteId};
use crate::gateway::{GatewayResult, NoteStoreGateway};

fn id_filter(id: &NoteId) -> String {
    format!("eq.{}", id)
}

#[async_trait]
impl NoteStoreGateway for RestBackend {
    async fn list_notes(&self) -> GatewayResult<Vec<Note>> {
        let request = self
            .authorized(self.http.get(self.table_url()))
            .await?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let notes: Vec<Note> = send_for(request).await?;
        tracing::debug!(count = notes.len(), "Fetched notes");
        Ok(notes)
    }

    async fn create_note(&self, title: &str, content: &str) -> GatewayResult<()> {
        let request = self
            .authorized(self.http.post(self.table_url()))
            .await?
            .header("Prefer", "return=minimal")
            .json(&json!([{ "title": title, "content": content }]));
        send(request).await?;
        Ok(())
    }

    async fn update_note(&self, id: &NoteId, title: &str, content: &str) -> GatewayResult<()> {
        let request = self
            .authorized(self.http.patch(self.table_url()))
            .await?
            .query(&[("id", id_filter(id))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "title": title, "content": content }));
        send(request).await?;
        Ok(())
    }

    async fn delete_note(&self, id: &NoteId) -> GatewayResult<()> {
        let request = self
            .authorized(self.http.delete(self.table_url()))
            .await?
            .query(&[("id", id_filter(id))]);
        send(request).await?;
        Ok(())
    }
}

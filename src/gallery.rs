use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::error::GenerationError;
use crate::models::{GeneratedAsset, GenerationBatch, VideoState};

/// Identifies the generation a response belongs to. Responses carrying an
/// outdated ticket are dropped instead of merged into a newer batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

/// Current batch plus a bounded, most-recent-first history.
///
/// Every operation is total: unknown ids and out-of-range history indices are no-ops.
#[derive(Debug, Clone)]
pub struct Gallery {
    current: Option<GenerationBatch>,
    history: VecDeque<GenerationBatch>,
    history_limit: usize,
    generation: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub index: usize,
    pub batch_id: Uuid,
    pub asset_count: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct GalleryView {
    pub id: Uuid,
    pub assets: Vec<GeneratedAsset>,
    pub history: Vec<HistoryEntry>,
}

impl Gallery {
    pub fn new(history_limit: usize) -> Self {
        Self { current: None, history: VecDeque::new(), history_limit, generation: 0 }
    }

    pub fn assets(&self) -> &[GeneratedAsset] {
        self.current.as_ref().map(|b| b.assets.as_slice()).unwrap_or(&[])
    }

    pub fn history(&self) -> impl Iterator<Item = &GenerationBatch> {
        self.history.iter()
    }

    pub fn favorites(&self) -> Vec<&GeneratedAsset> {
        self.assets().iter().filter(|a| a.favorite).collect()
    }

    pub fn asset(&self, id: &str) -> Option<&GeneratedAsset> {
        self.assets().iter().find(|a| a.id == id)
    }

    pub fn view(&self, id: Uuid) -> GalleryView {
        GalleryView {
            id,
            assets: self.assets().to_vec(),
            history: self
                .history
                .iter()
                .enumerate()
                .map(|(index, b)| HistoryEntry { index, batch_id: b.id, asset_count: b.assets.len(), created_at: b.created_at })
                .collect(),
        }
    }

    /// Starts a fresh generation; anything still in flight becomes stale.
    pub fn begin_generation(&mut self) -> GenerationTicket {
        self.generation += 1;
        GenerationTicket(self.generation)
    }

    pub fn current_ticket(&self) -> GenerationTicket {
        GenerationTicket(self.generation)
    }

    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Makes `batch` current and pushes the previous one into history.
    pub fn replace_batch(&mut self, batch: GenerationBatch) {
        if let Some(previous) = self.current.replace(batch) {
            self.push_history(previous);
        }
    }

    /// Adds a "generate more" batch to the current assets without touching history.
    pub fn append_more(&mut self, more: GenerationBatch) {
        match self.current.as_mut() {
            Some(batch) => batch.assets.extend(more.assets),
            None => self.current = Some(more),
        }
    }

    pub fn commit_batch(&mut self, ticket: GenerationTicket, batch: GenerationBatch) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.replace_batch(batch);
        true
    }

    pub fn commit_more(&mut self, ticket: GenerationTicket, batch: GenerationBatch) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.append_more(batch);
        true
    }

    pub fn toggle_favorite(&mut self, id: &str) {
        if let Some(asset) = self.asset_mut(id) {
            asset.favorite = !asset.favorite;
        }
    }

    pub fn remove(&mut self, id: &str) {
        if let Some(batch) = self.current.as_mut() {
            batch.assets.retain(|a| a.id != id);
        }
    }

    /// Brings a history entry back; the displaced current batch moves to the front of history.
    pub fn restore_batch(&mut self, index: usize) {
        let Some(restored) = self.history.remove(index) else {
            return;
        };
        if let Some(previous) = self.current.replace(restored) {
            if !previous.assets.is_empty() {
                self.push_history(previous);
            }
        }
    }

    /// Marks a video job as started. False when the asset is unknown or a job is already pending.
    pub fn begin_video(&mut self, id: &str) -> bool {
        match self.asset_mut(id) {
            Some(asset) if asset.video != VideoState::Pending => {
                asset.video = VideoState::Pending;
                true
            }
            _ => false,
        }
    }

    /// Settles a video job wherever its asset now lives, including batches moved into history.
    pub fn finish_video(&mut self, id: &str, result: Result<String, GenerationError>) {
        if let Some(asset) = self.any_asset_mut(id) {
            asset.video = match result {
                Ok(data) => VideoState::Completed { data },
                Err(err) => VideoState::Failed { message: err.to_string() },
            };
        }
    }

    fn asset_mut(&mut self, id: &str) -> Option<&mut GeneratedAsset> {
        self.current.as_mut()?.assets.iter_mut().find(|a| a.id == id)
    }

    fn any_asset_mut(&mut self, id: &str) -> Option<&mut GeneratedAsset> {
        self.current
            .iter_mut()
            .chain(self.history.iter_mut())
            .flat_map(|b| b.assets.iter_mut())
            .find(|a| a.id == id)
    }

    fn push_history(&mut self, batch: GenerationBatch) {
        if self.history_limit == 0 {
            return;
        }
        self.history.push_front(batch);
        self.history.truncate(self.history_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationMode;
    use pretty_assertions::assert_eq;

    fn batch(tag: &str, n: usize) -> GenerationBatch {
        let id = Uuid::new_v4();
        GenerationBatch {
            id,
            mode: GenerationMode::Broll,
            assets: (1..=n)
                .map(|v| GeneratedAsset {
                    id: format!("{}-{}-{}", tag, id, v),
                    variant: v,
                    image_data: format!("data:image/png;base64,{}", tag),
                    prompt_echo: tag.to_string(),
                    favorite: false,
                    video: VideoState::Idle,
                })
                .collect(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut gallery = Gallery::new(5);
        gallery.replace_batch(batch("a", 3));
        let before = gallery.assets().to_vec();

        gallery.toggle_favorite("missing");
        gallery.remove("missing");
        gallery.finish_video("missing", Ok("data:video/mp4;base64,AA".into()));
        assert!(!gallery.begin_video("missing"));
        assert_eq!(gallery.assets(), before.as_slice());
    }

    #[test]
    fn favorite_toggle_and_remove() {
        let mut gallery = Gallery::new(5);
        gallery.replace_batch(batch("a", 3));
        let id = gallery.assets()[1].id.clone();

        gallery.toggle_favorite(&id);
        assert_eq!(gallery.favorites().len(), 1);
        gallery.toggle_favorite(&id);
        assert!(gallery.favorites().is_empty());

        gallery.remove(&id);
        assert_eq!(gallery.assets().len(), 2);
        assert!(gallery.asset(&id).is_none());
    }

    #[test]
    fn history_is_bounded_and_most_recent_first() {
        let mut gallery = Gallery::new(2);
        let batches: Vec<_> = (0..4).map(|i| batch(&format!("b{}", i), 1)).collect();
        for b in &batches {
            gallery.replace_batch(b.clone());
        }
        let ids: Vec<_> = gallery.history().map(|b| b.id).collect();
        assert_eq!(ids, vec![batches[2].id, batches[1].id]);
        assert_eq!(gallery.view(Uuid::nil()).history.len(), 2);
    }

    #[test]
    fn restore_swaps_current_into_history() {
        let mut gallery = Gallery::new(5);
        let (first, second) = (batch("first", 2), batch("second", 2));
        gallery.replace_batch(first.clone());
        gallery.replace_batch(second.clone());

        gallery.restore_batch(0);
        assert_eq!(gallery.assets(), first.assets.as_slice());
        assert_eq!(gallery.history().next().unwrap().id, second.id);
        assert_eq!(gallery.history().count(), 1);

        gallery.restore_batch(7);
        assert_eq!(gallery.assets(), first.assets.as_slice());
    }

    #[test]
    fn append_more_keeps_existing_assets() {
        let mut gallery = Gallery::new(5);
        gallery.replace_batch(batch("a", 2));
        gallery.append_more(batch("more", 3));
        assert_eq!(gallery.assets().len(), 5);
        assert_eq!(gallery.history().count(), 0);
    }

    #[test]
    fn stale_tickets_are_dropped() {
        let mut gallery = Gallery::new(5);
        let old = gallery.begin_generation();
        let new = gallery.begin_generation();

        assert!(!gallery.commit_batch(old, batch("old", 2)));
        assert!(gallery.assets().is_empty());
        assert!(gallery.commit_batch(new, batch("new", 2)));

        let more_ticket = gallery.current_ticket();
        gallery.begin_generation();
        assert!(!gallery.commit_more(more_ticket, batch("late", 1)));
        assert_eq!(gallery.assets().len(), 2);
    }

    #[test]
    fn video_state_machine() {
        let mut gallery = Gallery::new(5);
        gallery.replace_batch(batch("a", 1));
        let id = gallery.assets()[0].id.clone();

        assert!(gallery.begin_video(&id));
        assert!(!gallery.begin_video(&id));
        gallery.finish_video(&id, Err(GenerationError::Transient("boom".into())));
        assert!(matches!(&gallery.asset(&id).unwrap().video, VideoState::Failed { message } if message.contains("boom")));

        assert!(gallery.begin_video(&id));
        gallery.finish_video(&id, Ok("data:video/mp4;base64,AA".into()));
        assert_eq!(gallery.asset(&id).unwrap().video, VideoState::Completed { data: "data:video/mp4;base64,AA".into() });
    }

    #[test]
    fn video_finishing_after_batch_moved_to_history_still_settles() {
        let mut gallery = Gallery::new(5);
        gallery.replace_batch(batch("a", 1));
        let id = gallery.assets()[0].id.clone();
        assert!(gallery.begin_video(&id));

        gallery.replace_batch(batch("b", 2));
        gallery.finish_video(&id, Ok("data:video/mp4;base64,AA".into()));

        gallery.restore_batch(0);
        assert_eq!(gallery.asset(&id).unwrap().video, VideoState::Completed { data: "data:video/mp4;base64,AA".into() });
        assert!(gallery.begin_video(&id));
    }
}

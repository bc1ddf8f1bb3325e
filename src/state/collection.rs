use chrono::Utc;
use tracing::{debug, info, warn};

use super::data::{Artwork, ArtworkDraft, ArtworkId, Direction, Filter};
use super::error::{GalleryError, LoadError, StorageError};
use super::storage::{ArtworkStorage, KeyValueStore};
use super::view;

/// What changed in the gallery, delivered to subscribers after each change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    Added(ArtworkId),
    Edited(ArtworkId),
    Deleted(ArtworkId),
    FilterChanged(Filter),
    SelectionChanged(Option<ArtworkId>),
}

type Listener = Box<dyn FnMut(&GalleryEvent)>;

/// Hands out artwork ids from the clock, never repeating one.
///
/// Each id is the current time in milliseconds, bumped past the last id issued
/// (or seen in the loaded collection) when two creations land in the same instant.
/// Once the top of the id range is taken, ids count down below the lowest id seen.
#[derive(Debug)]
struct IdAllocator {
    last: ArtworkId,
    lowest: ArtworkId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            last: 0,
            lowest: ArtworkId::MAX,
        }
    }
}

impl IdAllocator {
    fn seeded(existing: &[Artwork]) -> Self {
        let mut ids = Self::default();
        for artwork in existing {
            ids.last = ids.last.max(artwork.id);
            ids.lowest = ids.lowest.min(artwork.id);
        }
        ids
    }

    /// `None` only when every id above the highest and below the lowest is spent
    fn next(&mut self, now_ms: ArtworkId) -> Option<ArtworkId> {
        let id = match self.last.checked_add(1) {
            Some(bumped) => {
                self.last = now_ms.max(bumped);
                self.last
            }
            None => self.lowest.checked_sub(1)?,
        };
        self.lowest = self.lowest.min(id);
        Some(id)
    }
}

/// The artwork collection store.
///
/// Owns the ordered collection (newest first), the active filter and the
/// selected artwork. Every add/edit/delete re-saves the whole collection.
/// The in-memory collection stays authoritative when a save fails.
pub struct Gallery<S> {
    artworks: Vec<Artwork>,
    filter: Filter,
    /// Selection tracks identity, so edits show through
    selected: Option<ArtworkId>,
    storage: ArtworkStorage<S>,
    ids: IdAllocator,
    listeners: Vec<Listener>,
}

impl<S: KeyValueStore> Gallery<S> {
    /// Load the stored collection and start with no filter or selection.
    ///
    /// Unreadable stored data is logged, discarded and replaced by an empty
    /// collection. Backend failures are returned.
    pub fn open(mut storage: ArtworkStorage<S>) -> Result<Self, StorageError> {
        let artworks = match storage.load() {
            Ok(artworks) => artworks,
            Err(LoadError::Decode(err)) => {
                warn!(error = %err, "discarding unreadable stored artworks");
                if let Err(err) = storage.discard() {
                    warn!(error = %err, "failed to remove unreadable stored artworks");
                }
                Vec::new()
            }
            Err(LoadError::Storage(err)) => return Err(err),
        };

        info!(count = artworks.len(), "gallery loaded");

        Ok(Self {
            ids: IdAllocator::seeded(&artworks),
            artworks,
            filter: Filter::default(),
            selected: None,
            storage,
            listeners: Vec::new(),
        })
    }

    /// Register an observer notified after every state change
    pub fn subscribe(&mut self, listener: impl FnMut(&GalleryEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ========== Read accessors ==========

    /// The whole collection, newest first
    pub fn artworks(&self) -> &[Artwork] {
        &self.artworks
    }

    pub fn get(&self, id: ArtworkId) -> Option<&Artwork> {
        self.artworks.iter().find(|a| a.id == id)
    }

    pub fn storage(&self) -> &ArtworkStorage<S> {
        &self.storage
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The selected artwork with its current field values
    pub fn selection(&self) -> Option<&Artwork> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Artworks visible under the active filter
    pub fn visible(&self) -> Vec<&Artwork> {
        view::visible_list(&self.artworks, &self.filter)
    }

    /// Whether `id` was added through this gallery (and may be edited or deleted)
    pub fn is_user_created(&self, id: ArtworkId) -> bool {
        self.get(id).is_some()
    }

    /// Tool new uploads are tagged with: the active filter's tool.
    /// `None` under "All", where uploading isn't offered.
    pub fn upload_tool(&self) -> Option<&str> {
        self.filter.tool()
    }

    // ========== Mutations ==========

    /// Create an artwork from `draft` and put it at the front of the collection.
    pub fn add(&mut self, draft: ArtworkDraft) -> Result<Artwork, GalleryError> {
        let id = self
            .ids
            .next(Utc::now().timestamp_millis())
            .ok_or(GalleryError::IdsExhausted)?;
        let artwork = draft.into_artwork(id);
        self.artworks.insert(0, artwork.clone());

        debug!(id, tool = %artwork.tool, "artwork added");
        self.commit(GalleryEvent::Added(id))?;
        Ok(artwork)
    }

    /// Replace every descriptive field of artwork `id`.
    pub fn edit(&mut self, id: ArtworkId, draft: ArtworkDraft) -> Result<Artwork, GalleryError> {
        let artwork = self
            .artworks
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(GalleryError::NotFound(id))?;
        artwork.apply(draft);
        let edited = artwork.clone();

        debug!(id, "artwork edited");
        self.commit(GalleryEvent::Edited(id))?;
        Ok(edited)
    }

    /// Remove artwork `id`, clearing the selection if it was selected.
    pub fn delete(&mut self, id: ArtworkId) -> Result<Artwork, GalleryError> {
        let index = self
            .artworks
            .iter()
            .position(|a| a.id == id)
            .ok_or(GalleryError::NotFound(id))?;
        let removed = self.artworks.remove(index);

        if self.selected == Some(id) {
            self.selected = None;
            self.emit(&GalleryEvent::SelectionChanged(None));
        }

        debug!(id, remaining = self.artworks.len(), "artwork deleted");
        self.commit(GalleryEvent::Deleted(id))?;
        Ok(removed)
    }

    /// Change the active filter. The collection and selection are untouched.
    pub fn set_filter(&mut self, filter: Filter) {
        if self.filter == filter {
            return;
        }
        self.filter = filter.clone();
        self.emit(&GalleryEvent::FilterChanged(filter));
    }

    /// Select artwork `id`, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<ArtworkId>) -> Result<(), GalleryError> {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(GalleryError::NotFound(id));
            }
        }
        self.set_selected(id);
        Ok(())
    }

    /// Move the selection to the previous/next visible artwork, wrapping around.
    ///
    /// Does nothing (and returns `None`) when nothing is selected or the
    /// selected artwork is hidden by the active filter.
    pub fn navigate(&mut self, direction: Direction) -> Option<&Artwork> {
        let current = self.selected?;
        let target = view::navigate(&self.visible(), current, direction)?.id;

        self.set_selected(Some(target));
        self.get(target)
    }

    fn set_selected(&mut self, id: Option<ArtworkId>) {
        if self.selected != id {
            self.selected = id;
            self.emit(&GalleryEvent::SelectionChanged(id));
        }
    }

    /// Persist the whole collection, then tell observers.
    /// Observers hear about the change even if the save failed.
    fn commit(&mut self, event: GalleryEvent) -> Result<(), StorageError> {
        let saved = self.storage.save(&self.artworks);
        if let Err(err) = &saved {
            warn!(error = %err, "failed to save artworks; keeping in-memory collection");
        }
        self.emit(&event);
        saved
    }

    fn emit(&mut self, event: &GalleryEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Gallery<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("artworks", &self.artworks.len())
            .field("filter", &self.filter)
            .field("selected", &self.selected)
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

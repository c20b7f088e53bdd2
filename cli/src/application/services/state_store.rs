//! Application service: the remote state document and its lock marker.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! The document and the marker both live in an injected `ObjectStore`.

use anyhow::{Context, Result};

use crate::application::ports::ObjectStore;
use crate::domain::error::DomainError;
use crate::domain::{EdgeState, StateLocation};

/// What `load` does when no state document exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Return an empty document (used while initialising).
    Permissive,
    /// Fail with a fatal error telling the operator to run `edge init`.
    Strict,
}

/// How a command wants to hold the state for its duration.
#[derive(Debug, Clone, Copy)]
pub struct AcquireOptions {
    pub lock: bool,
    pub save: bool,
    pub mode: LoadMode,
}

impl AcquireOptions {
    /// Read-only access: no lock, no save.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            lock: false,
            save: false,
            mode: LoadMode::Strict,
        }
    }

    /// Exclusive access: lock, then save on release.
    #[must_use]
    pub fn exclusive() -> Self {
        Self {
            lock: true,
            save: true,
            mode: LoadMode::Strict,
        }
    }
}

/// Proof that this process created the lock marker.
#[derive(Debug)]
#[must_use]
pub struct StateLock {
    key: String,
}

impl StateLock {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// State document access for one project in one storage location.
pub struct StateStore<'a, O: ObjectStore> {
    store: &'a O,
    location: StateLocation,
}

impl<'a, O: ObjectStore> StateStore<'a, O> {
    pub fn new(store: &'a O, location: StateLocation) -> Self {
        Self { store, location }
    }

    #[must_use]
    pub fn location(&self) -> &StateLocation {
        &self.location
    }

    /// Whether a state document has been saved before.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store cannot be queried.
    pub async fn exists(&self) -> Result<bool> {
        self.store.exists(&self.location.state_key).await
    }

    /// Fetch the state document.
    ///
    /// # Errors
    ///
    /// In `Strict` mode a missing document is a fatal `DomainError`. A
    /// corrupted document is always fatal.
    pub async fn load(&self, mode: LoadMode) -> Result<EdgeState> {
        if !self.exists().await? {
            tracing::debug!(key = %self.location.state_key, ?mode, "state document absent");
            return match mode {
                LoadMode::Permissive => Ok(EdgeState::default()),
                LoadMode::Strict => Err(DomainError::new(format!(
                    "The state file does not exist in {}. Run `edge init` to initialise.",
                    self.store.location()
                ))
                .into()),
            };
        }
        let bytes = self
            .store
            .read(&self.location.state_key)
            .await
            .with_context(|| format!("reading {}", self.location.state_key))?;
        let state = EdgeState::from_bytes(&bytes)?;
        tracing::debug!(models = state.models.len(), "loaded state");
        Ok(state)
    }

    /// Overwrite the state document with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, state: &EdgeState) -> Result<()> {
        let bytes = state.to_bytes()?;
        self.store
            .write(&self.location.state_key, &bytes)
            .await
            .with_context(|| format!("writing {}", self.location.state_key))?;
        tracing::debug!(models = state.models.len(), "saved state");
        Ok(())
    }

    /// Create the lock marker.
    ///
    /// # Errors
    ///
    /// Fatal `DomainError` if the storage location does not exist yet, or if
    /// the marker already exists (including losing a creation race).
    pub async fn lock(&self) -> Result<StateLock> {
        if !self.store.location_exists().await? {
            return Err(DomainError::new(format!(
                "Cannot lock the state: storage bucket {} does not exist. Run `edge init` to create it.",
                self.store.location()
            ))
            .into());
        }
        let key = &self.location.lock_key;
        if self.store.exists(key).await? || !self.store.create_new(key, &[]).await? {
            return Err(DomainError::new(
                "The state is locked by another operation. If no other edge command is running, \
                 run `edge force-unlock` to remove the lock.",
            )
            .into());
        }
        tracing::debug!(key, "acquired state lock");
        Ok(StateLock { key: key.clone() })
    }

    /// Delete the lock marker. Does nothing when it is already absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store delete fails.
    pub async fn unlock(&self) -> Result<()> {
        self.store.delete(&self.location.lock_key).await?;
        tracing::debug!(key = %self.location.lock_key, "released state lock");
        Ok(())
    }

    /// Lock (when requested) and load the state.
    ///
    /// The returned lease must be given back through [`StateLease::release`],
    /// which saves and unlocks on every exit path.
    ///
    /// # Errors
    ///
    /// Returns the lock or load error. If loading fails after the lock was
    /// taken, the lock is released before returning; a failure to release
    /// is logged and the load error is still the one returned.
    pub async fn acquire(&self, opts: AcquireOptions) -> Result<StateLease<'_, 'a, O>> {
        let lock = if opts.lock {
            Some(self.lock().await?)
        } else {
            None
        };
        match self.load(opts.mode).await {
            Ok(state) => Ok(StateLease {
                store: self,
                state,
                lock,
                save: opts.save,
                released: false,
            }),
            Err(err) => {
                if lock.is_some() {
                    if let Err(unlock_err) = self.unlock().await {
                        tracing::warn!(
                            error = %unlock_err,
                            key = %self.location.lock_key,
                            "failed to release state lock after load error"
                        );
                    }
                }
                Err(err)
            }
        }
    }
}

/// State held by a command between `acquire` and `release`.
pub struct StateLease<'s, 'a, O: ObjectStore> {
    store: &'s StateStore<'a, O>,
    pub state: EdgeState,
    lock: Option<StateLock>,
    save: bool,
    released: bool,
}

impl<O: ObjectStore> StateLease<'_, '_, O> {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// End the scope: save if requested, then unlock if locked.
    ///
    /// The save happens whether or not `outcome` is `Ok`, so remote changes a
    /// command made before failing are still recorded.
    ///
    /// # Errors
    ///
    /// Returns `outcome`'s error first; save and unlock errors otherwise.
    pub async fn release<T>(mut self, outcome: Result<T>) -> Result<T> {
        self.released = true;
        let saved = if self.save {
            self.store.save(&self.state).await
        } else {
            Ok(())
        };
        if let (Err(_), Err(save_err)) = (&outcome, &saved) {
            tracing::warn!(error = %save_err, "failed to save state after command error");
        }
        let unlocked = match self.lock.take() {
            Some(_) => self.store.unlock().await,
            None => Ok(()),
        };
        let value = outcome?;
        saved?;
        unlocked?;
        Ok(value)
    }
}

impl<O: ObjectStore> Drop for StateLease<'_, '_, O> {
    fn drop(&mut self) {
        if !self.released && self.lock.is_some() {
            tracing::warn!(
                key = %self.store.location.lock_key,
                "state lock was not released; run `edge force-unlock` to remove it"
            );
        }
    }
}

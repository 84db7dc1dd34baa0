//! Asset queue and background loading.
//!
//! Requests are queued up front, then [`AssetManager::load`] hands them to a
//! worker thread and returns a [`PendingLoad`]. The event loop polls it each
//! iteration; nothing that depends on assets is built before it resolves.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use thiserror::Error;

use crate::geometry::{GeometryError, Primitive, RawGeometry};

/// Largest dimension of every model after loading.
pub const MODEL_EXTENT: f32 = 2.0;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load asset '{name}': {source}")]
    Geometry {
        name: String,
        #[source]
        source: GeometryError,
    },
    #[error("asset '{0}' was not loaded")]
    Missing(String),
    #[error("asset worker exited without reporting a result")]
    WorkerLost,
}

/// Where a geometry asset comes from.
#[derive(Clone, Debug)]
pub enum AssetSource {
    Primitive(Primitive),
    StlFile(PathBuf),
    StlBytes(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct AssetRequest {
    pub name: String,
    pub source: AssetSource,
}

/// Geometry produced by a completed load, keyed by request name.
#[derive(Debug, Default)]
pub struct LoadedAssets {
    geometries: HashMap<String, RawGeometry>,
}

impl LoadedAssets {
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn geometry(&self, name: &str) -> Option<&RawGeometry> {
        self.geometries.get(name)
    }

    /// Removes and returns a geometry, failing if it was never loaded.
    pub fn take_geometry(&mut self, name: &str) -> Result<RawGeometry, AssetError> {
        self.geometries
            .remove(name)
            .ok_or_else(|| AssetError::Missing(name.to_string()))
    }
}

/// Collects asset requests until [`load`](Self::load) is called.
#[derive(Debug, Default)]
pub struct AssetManager {
    queue: Vec<AssetRequest>,
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a geometry asset under `name`. Later requests replace earlier
    /// ones with the same name.
    pub fn queue(&mut self, name: impl Into<String>, source: AssetSource) -> &mut Self {
        self.queue.push(AssetRequest {
            name: name.into(),
            source,
        });
        self
    }

    pub fn queued(&self) -> &[AssetRequest] {
        &self.queue
    }

    /// Start loading every queued request on a worker thread.
    ///
    /// The queue is drained; the first failing request fails the whole load.
    pub fn load(&mut self) -> PendingLoad {
        let requests = std::mem::take(&mut self.queue);
        let (tx, rx) = mpsc::channel();

        tracing::info!(count = requests.len(), "loading assets");

        thread::spawn(move || {
            // The receiver may be gone if the app exited mid-load
            let _ = tx.send(load_all(requests));
        });

        PendingLoad { rx, done: false }
    }
}

/// A load in flight.
pub struct PendingLoad {
    rx: mpsc::Receiver<Result<LoadedAssets, AssetError>>,
    done: bool,
}

impl PendingLoad {
    /// Non-blocking check. Returns the outcome exactly once.
    pub fn poll(&mut self) -> Option<Result<LoadedAssets, AssetError>> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(AssetError::WorkerLost))
            }
        }
    }

    /// Block until the load finishes.
    pub fn wait(self) -> Result<LoadedAssets, AssetError> {
        self.rx.recv().map_err(|_| AssetError::WorkerLost)?
    }
}

fn load_all(requests: Vec<AssetRequest>) -> Result<LoadedAssets, AssetError> {
    let mut loaded = LoadedAssets::default();
    for request in requests {
        let geometry = load_geometry(&request.source).map_err(|source| AssetError::Geometry {
            name: request.name.clone(),
            source,
        })?;
        tracing::debug!(
            name = %request.name,
            triangles = geometry.triangle_count(),
            "asset ready"
        );
        loaded.geometries.insert(request.name, geometry);
    }
    Ok(loaded)
}

fn load_geometry(source: &AssetSource) -> Result<RawGeometry, GeometryError> {
    let mut geometry = match source {
        AssetSource::Primitive(primitive) => primitive.build(),
        AssetSource::StlFile(path) => RawGeometry::from_file(path)?,
        AssetSource::StlBytes(bytes) => RawGeometry::from_stl_bytes(bytes)?,
    };

    if geometry.triangle_count() == 0 {
        return Err(GeometryError::Empty);
    }

    // Some exporters write zero facet normals
    if geometry
        .vertices
        .iter()
        .any(|v| v.normal == [0.0; 3])
    {
        geometry.recalculate_normals();
    }

    geometry.recenter();
    geometry.fit(MODEL_EXTENT);
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSET_TRIANGLE: &str = "solid tri
facet normal 0 0 0
  outer loop
    vertex 10 10 0
    vertex 14 10 0
    vertex 10 12 0
  endloop
endfacet
endsolid tri
";

    #[test]
    fn procedural_asset_resolves() {
        let mut assets = AssetManager::new();
        assets.queue("model", AssetSource::Primitive(Primitive::Cube));
        let loaded = assets.load().wait().unwrap();

        let cube = loaded.geometry("model").unwrap();
        assert_eq!(cube.triangle_count(), 12);
        assert!((cube.size().x - MODEL_EXTENT).abs() < 1e-5);
        assert!(assets.queued().is_empty());
    }

    #[test]
    fn stl_is_centered_normalized_and_gets_normals() {
        let mut assets = AssetManager::new();
        assets.queue(
            "tri",
            AssetSource::StlBytes(OFFSET_TRIANGLE.as_bytes().to_vec()),
        );
        let mut loaded = assets.load().wait().unwrap();
        let tri = loaded.take_geometry("tri").unwrap();

        assert!(tri.center().length() < 1e-5);
        assert!((tri.size().x - MODEL_EXTENT).abs() < 1e-5);
        assert_eq!(tri.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert!(matches!(
            loaded.take_geometry("tri"),
            Err(AssetError::Missing(_))
        ));
    }

    #[test]
    fn missing_file_rejects_whole_load() {
        let mut assets = AssetManager::new();
        assets
            .queue("ok", AssetSource::Primitive(Primitive::Cube))
            .queue(
                "missing",
                AssetSource::StlFile(PathBuf::from("/nonexistent/model.stl")),
            );

        match assets.load().wait() {
            Err(AssetError::Geometry { name, source }) => {
                assert_eq!(name, "missing");
                assert!(matches!(source, GeometryError::Io(_)));
            }
            other => panic!("expected geometry error, got {other:?}"),
        }
    }

    #[test]
    fn poll_reports_outcome_once() {
        let mut assets = AssetManager::new();
        assets.queue("model", AssetSource::Primitive(Primitive::Cube));
        let mut pending = assets.load();

        let result = loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            std::thread::yield_now();
        };
        assert!(result.is_ok());
        assert!(pending.poll().is_none());
    }
}

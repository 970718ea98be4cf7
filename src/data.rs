//! One-shot asynchronous loading of the three JSON documents and the
//! per-body texture assets.
//!
//! On native targets a background thread reads (or fetches) each document
//! and decodes each texture, reporting over an mpsc channel the UI polls
//! every frame. On wasm the fetches run as spawned futures writing into
//! thread-local result cells.

use crate::celestial::Body;
use crate::ephemeris::Ephemeris;
use crate::events::Event;
use crate::texture::BodyTexture;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DocKind {
    Positions,
    Events,
    MoonEvents,
}

impl DocKind {
    pub const ALL: [DocKind; 3] = [DocKind::Positions, DocKind::Events, DocKind::MoonEvents];

    pub fn filename(&self) -> &'static str {
        match self {
            DocKind::Positions => "positions.json",
            DocKind::Events => "events_feed.json",
            DocKind::MoonEvents => "moon_events_feed.json",
        }
    }
}

pub enum EphemerisState {
    Loading,
    Loaded(Ephemeris),
    Failed(String),
}

pub enum FeedState {
    Loading,
    Loaded(Vec<Event>),
    Failed(String),
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn asset_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::*;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use std::sync::mpsc;

    #[derive(Clone)]
    pub enum DataSource {
        Dir(std::path::PathBuf),
        Url(String),
    }

    impl DataSource {
        /// First CLI argument, then `ORRERY_DATA`, then the crate-relative
        /// `data/` directory. Anything starting with `http` is a base URL.
        pub fn from_arg(arg: Option<String>) -> Self {
            let value = arg.or_else(|| std::env::var("ORRERY_DATA").ok());
            match value {
                Some(v) if v.starts_with("http://") || v.starts_with("https://") => {
                    DataSource::Url(v)
                }
                Some(v) => DataSource::Dir(std::path::PathBuf::from(v)),
                None => DataSource::Dir(asset_path("data")),
            }
        }

        pub fn describe(&self) -> String {
            match self {
                DataSource::Dir(d) => d.display().to_string(),
                DataSource::Url(u) => u.clone(),
            }
        }

        fn load(&self, name: &str) -> Result<String, String> {
            match self {
                DataSource::Dir(dir) => {
                    let path = dir.join(name);
                    std::fs::read_to_string(&path)
                        .map_err(|e| format!("{}: {}", path.display(), e))
                }
                DataSource::Url(base) => {
                    let url = format!("{}/{}", base.trim_end_matches('/'), name);
                    ureq::get(&url)
                        .call()
                        .map_err(|e| format!("HTTP error: {}", e))?
                        .into_string()
                        .map_err(|e| format!("Read error: {}", e))
                }
            }
        }
    }

    pub fn spawn_document_loader(
        source: DataSource,
        tx: mpsc::Sender<(DocKind, Result<String, String>)>,
    ) {
        std::thread::spawn(move || {
            for kind in DocKind::ALL {
                let result = source.load(kind.filename());
                if tx.send((kind, result)).is_err() {
                    return;
                }
            }
        });
    }

    /// Decode is the expensive part, so it happens on the worker as well.
    pub fn spawn_texture_loader(tx: mpsc::Sender<(Body, Result<BodyTexture, String>)>) {
        std::thread::spawn(move || {
            for body in Body::ALL {
                let path = asset_path(&body.texture_filename());
                let result = std::fs::read(&path)
                    .map_err(|e| format!("{}: {}", path.display(), e))
                    .and_then(|bytes| BodyTexture::from_bytes(&bytes));
                if tx.send((body, result)).is_err() {
                    return;
                }
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;

    thread_local! {
        pub(crate) static DOC_FETCH_RESULT:
            std::cell::RefCell<Vec<(DocKind, Result<String, String>)>> =
            std::cell::RefCell::new(Vec::new());
        pub(crate) static TEXTURE_FETCH_RESULT:
            std::cell::RefCell<Vec<(Body, Result<BodyTexture, String>)>> =
            std::cell::RefCell::new(Vec::new());
    }

    /// Kick off all document and texture fetches relative to the page URL.
    pub fn start_fetches() {
        for kind in DocKind::ALL {
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_bytes(kind.filename()).await.and_then(|bytes| {
                    String::from_utf8(bytes).map_err(|e| format!("{}", e))
                });
                DOC_FETCH_RESULT.with(|cell| cell.borrow_mut().push((kind, result)));
            });
        }
        for body in Body::ALL {
            wasm_bindgen_futures::spawn_local(async move {
                let url = body.texture_filename();
                let result = fetch_bytes(&url)
                    .await
                    .and_then(|bytes| BodyTexture::from_bytes(&bytes));
                TEXTURE_FETCH_RESULT.with(|cell| cell.borrow_mut().push((body, result)));
            });
        }
    }

    async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        use wasm_bindgen::JsCast as _;
        use web_sys::{Request, RequestInit, RequestMode, Response};

        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(url, &opts)
            .map_err(|e| format!("Failed to create request: {:?}", e))?;

        let window = web_sys::window().ok_or("No window")?;
        let resp_value =
            wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(|e| format!("Fetch failed: {:?}", e))?;

        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| "Response is not a Response")?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let array_buffer = wasm_bindgen_futures::JsFuture::from(
            resp.array_buffer()
                .map_err(|e| format!("Failed to get array buffer: {:?}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to read response: {:?}", e))?;

        Ok(js_sys::Uint8Array::new(&array_buffer).to_vec())
    }
}

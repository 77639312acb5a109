//! Browser file picker and download trigger.

use std::{cell::RefCell, rc::Rc};

use futures::channel::oneshot;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

use vault_host::NewRecord;

/// Sender half shared by several DOM handlers; only the first event to settle is delivered.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct SettleOnce<T>(Rc<RefCell<Option<oneshot::Sender<T>>>>);

impl<T> Clone for SettleOnce<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl<T> SettleOnce<T> {
    fn channel() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self(Rc::new(RefCell::new(Some(tx)))), rx)
    }

    /// Returns false when an earlier event already settled the channel.
    fn settle(&self, value: T) -> bool {
        match self.0.borrow_mut().take() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// File chosen through the picker, fully read into memory.
pub struct PickedFile {
    /// File name as reported by the browser.
    pub name: String,
    /// Browser-reported MIME type; may be empty.
    pub mime_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl PickedFile {
    /// Converts into an upload carrying its bytes.
    pub fn into_new_record(self) -> NewRecord {
        NewRecord::from_bytes(self.name, self.bytes)
    }
}

/// Opens the browser file picker and reads every selected file.
///
/// Resolves to an empty list when the dialog is dismissed without a selection.
///
/// # Errors
///
/// Returns an error outside wasm32 or when a read fails.
pub async fn pick_files(multiple: bool) -> Result<Vec<PickedFile>, String> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = multiple;
        Err("file picking is only available when compiled for wasm32".to_string())
    }

    #[cfg(target_arch = "wasm32")]
    {
        let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;
        let document = window
            .document()
            .ok_or_else(|| "document unavailable".to_string())?;
        let input = document
            .create_element("input")
            .map_err(|err| format!("failed to create file input: {err:?}"))?
            .dyn_into::<web_sys::HtmlInputElement>()
            .map_err(|_| "failed to cast file input".to_string())?;
        input.set_type("file");
        input.set_multiple(multiple);
        input.set_hidden(true);

        if let Some(body) = document.body() {
            let _ = body.append_child(&input);
        }

        let (settle, rx) = SettleOnce::<Vec<web_sys::File>>::channel();
        let input_for_change = input.clone();
        let change_settle = settle.clone();
        let on_change = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_| {
            let files = input_for_change
                .files()
                .map(|list| (0..list.length()).filter_map(|idx| list.get(idx)).collect())
                .unwrap_or_default();
            change_settle.settle(files);
        }));
        input.set_onchange(Some(on_change.as_ref().unchecked_ref()));

        let cancel_settle = settle.clone();
        let on_cancel = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_| {
            cancel_settle.settle(Vec::new());
        }));
        let cancel_listener = input
            .add_event_listener_with_callback("cancel", on_cancel.as_ref().unchecked_ref());
        input.click();

        // The input goes away on every exit path, including a dropped sender.
        let outcome = rx
            .await
            .map_err(|_| "file picker was interrupted".to_string());
        input.set_onchange(None);
        if cancel_listener.is_ok() {
            let _ = input.remove_event_listener_with_callback(
                "cancel",
                on_cancel.as_ref().unchecked_ref(),
            );
        }
        input.remove();
        drop(on_change);
        drop(on_cancel);
        let files = outcome?;
        if files.is_empty() {
            log::debug!("file picker closed without a selection");
            return Ok(Vec::new());
        }

        let mut picked = Vec::with_capacity(files.len());
        for file in files {
            let bytes = read_file_bytes(&file).await?;
            picked.push(PickedFile {
                name: file.name(),
                mime_type: file.type_(),
                bytes,
            });
        }
        log::debug!("picked {} file(s)", picked.len());
        Ok(picked)
    }
}

#[cfg(target_arch = "wasm32")]
async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let reader = web_sys::FileReader::new().map_err(|err| format!("{err:?}"))?;
    let (settle, rx) = SettleOnce::<Result<Vec<u8>, String>>::channel();

    let reader_for_load = reader.clone();
    let load_settle = settle.clone();
    let on_load = Closure::<dyn FnMut(web_sys::ProgressEvent)>::wrap(Box::new(move |_| {
        let result = reader_for_load
            .result()
            .map_err(|err| format!("failed to read file: {err:?}"))
            .map(|value| js_sys::Uint8Array::new(&value).to_vec());
        load_settle.settle(result);
    }));
    reader.set_onload(Some(on_load.as_ref().unchecked_ref()));

    let on_error = Closure::<dyn FnMut(web_sys::ProgressEvent)>::wrap(Box::new(move |_| {
        settle.settle(Err("failed to load file".to_string()));
    }));
    reader.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    reader
        .read_as_array_buffer(file)
        .map_err(|err| format!("failed to start file read: {err:?}"))?;

    let result = rx
        .await
        .map_err(|_| "file read was interrupted".to_string())?;
    reader.set_onload(None);
    reader.set_onerror(None);
    drop(on_load);
    drop(on_error);
    result
}

/// Saves `href` (usually a data URL) to disk under `file_name` via a temporary anchor.
///
/// # Errors
///
/// Returns an error outside wasm32 or when the anchor cannot be created.
pub fn trigger_download(file_name: &str, href: &str) -> Result<(), String> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (file_name, href);
        Err("downloads are only available when compiled for wasm32".to_string())
    }

    #[cfg(target_arch = "wasm32")]
    {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| "document unavailable".to_string())?;
        let anchor = document
            .create_element("a")
            .map_err(|err| format!("failed to create anchor: {err:?}"))?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| "failed to cast anchor".to_string())?;
        anchor.set_href(href);
        anchor.set_download(file_name);
        if let Some(body) = document.body() {
            let _ = body.append_child(&anchor);
        }
        anchor.click();
        anchor.remove();
        Ok(())
    }
}

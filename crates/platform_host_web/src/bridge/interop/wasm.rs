use std::{future::Future, rc::Rc};

use js_sys::{Promise, Reflect};
use platform_host::{
    ChannelListener, FsFuture, HostError, HostResult, Record, RuntimeSnapshot, Subscription,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use serde_wasm_bindgen::{from_value, Serializer};
use tracing::error;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, MessageEvent, RequestCredentials, RequestInit, Response, WebSocket};

use super::deliver_frame;
use crate::fs::{
    scoped::{
        DirectoryAccessHandle, FileAccessHandle, FileAccessPicker, HandleFuture, PickerError,
    },
    virtual_fs::{FileInputSource, SelectedFile},
};

#[wasm_bindgen(inline_js = r#"
const connections = new Map();

function namedError(name, message) {
  const err = new Error(message);
  err.name = name;
  return err;
}

function describe(err) {
  return (err && err.message) || String(err);
}

function requestToPromise(req) {
  return new Promise((resolve, reject) => {
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('IndexedDB request failed'));
  });
}

function txDone(tx) {
  return new Promise((resolve, reject) => {
    tx.oncomplete = () => resolve();
    tx.onabort = () => reject(tx.error || new Error('IndexedDB transaction aborted'));
    tx.onerror = () => reject(tx.error || new Error('IndexedDB transaction error'));
  });
}

export async function idbOpen(name, version, stores) {
  if (typeof indexedDB === 'undefined') {
    throw namedError('NotSupportedError', 'IndexedDB is unavailable in this browser context');
  }
  if (connections.has(name)) {
    return null;
  }
  const db = await new Promise((resolve, reject) => {
    const req = indexedDB.open(name, version);
    req.onupgradeneeded = () => {
      const upgrading = req.result;
      for (const store of stores) {
        if (upgrading.objectStoreNames.contains(store.name)) {
          continue;
        }
        const created = upgrading.createObjectStore(store.name, { keyPath: store.keyPath });
        for (const index of store.indexes) {
          created.createIndex(index.name, index.keyPath, { unique: false });
        }
      }
    };
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('Failed to open IndexedDB'));
    req.onblocked = () =>
      reject(namedError('InvalidStateError', 'IndexedDB upgrade blocked by an open connection'));
  });
  db.onversionchange = () => {
    db.close();
    connections.delete(name);
  };
  connections.set(name, db);
  return null;
}

export function idbClose(name) {
  const db = connections.get(name);
  if (db) {
    db.close();
    connections.delete(name);
  }
}

async function withStore(name, storeName, mode, fn) {
  const db = connections.get(name);
  if (!db) {
    throw namedError('InvalidStateError', 'Database not initialized or invalid query');
  }
  if (!db.objectStoreNames.contains(storeName)) {
    throw namedError('NotFoundError', 'object store `' + storeName + '` not found');
  }
  const tx = db.transaction(storeName, mode);
  const result = await fn(tx.objectStore(storeName));
  await txDone(tx);
  return result;
}

async function write(name, storeName, label, fn) {
  return await withStore(name, storeName, 'readwrite', async (store) => {
    try {
      await requestToPromise(fn(store));
    } catch (err) {
      throw namedError('BackendError', label + ' failed: ' + describe(err));
    }
    return null;
  });
}

export async function idbGetAll(name, storeName) {
  return await withStore(name, storeName, 'readonly', async (store) => {
    return await requestToPromise(store.getAll());
  });
}

export async function idbAdd(name, storeName, record) {
  return await write(name, storeName, 'Insert', (store) => store.add(record));
}

export async function idbPut(name, storeName, record) {
  return await write(name, storeName, 'Update', (store) => store.put(record));
}

export async function idbDelete(name, storeName, key) {
  return await write(name, storeName, 'Delete', (store) => store.delete(key));
}

function requirePicker(name) {
  if (typeof window[name] !== 'function') {
    throw namedError('NotSupportedError', name + ' is unavailable in this browser context');
  }
  return window[name];
}

export async function pickFile() {
  const handles = await requirePicker('showOpenFilePicker').call(window, { multiple: false });
  return handles[0];
}

export async function pickDirectory() {
  return await requirePicker('showDirectoryPicker').call(window);
}

export async function pickSaveFile(suggestedName) {
  const options = suggestedName ? { suggestedName } : {};
  return await requirePicker('showSaveFilePicker').call(window, options);
}

export async function readHandleText(handle) {
  const file = await handle.getFile();
  return await file.text();
}

export async function writeHandleText(handle, text) {
  const writable = await handle.createWritable();
  await writable.write(text);
  await writable.close();
  return null;
}

export async function directoryEntryNames(handle) {
  const names = [];
  for await (const entry of handle.values()) {
    names.push(entry.name);
  }
  return names;
}

export function chooseInputFile() {
  return new Promise((resolve, reject) => {
    const input = document.createElement('input');
    input.type = 'file';
    input.style.display = 'none';
    input.addEventListener('change', async () => {
      const file = input.files && input.files[0];
      input.remove();
      if (!file) {
        resolve(null);
        return;
      }
      try {
        resolve({ name: file.name, content: await file.text() });
      } catch (err) {
        reject(err);
      }
    }, { once: true });
    input.addEventListener('cancel', () => {
      input.remove();
      resolve(null);
    }, { once: true });
    (document.body || document.documentElement).appendChild(input);
    input.click();
  });
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = idbOpen)]
    fn js_idb_open(database: &str, version: u32, stores: JsValue) -> Promise;
    #[wasm_bindgen(js_name = idbClose)]
    fn js_idb_close(database: &str);
    #[wasm_bindgen(js_name = idbGetAll)]
    fn js_idb_get_all(database: &str, store: &str) -> Promise;
    #[wasm_bindgen(js_name = idbAdd)]
    fn js_idb_add(database: &str, store: &str, record: JsValue) -> Promise;
    #[wasm_bindgen(js_name = idbPut)]
    fn js_idb_put(database: &str, store: &str, record: JsValue) -> Promise;
    #[wasm_bindgen(js_name = idbDelete)]
    fn js_idb_delete(database: &str, store: &str, key: JsValue) -> Promise;

    #[wasm_bindgen(js_name = pickFile)]
    fn js_pick_file() -> Promise;
    #[wasm_bindgen(js_name = pickDirectory)]
    fn js_pick_directory() -> Promise;
    #[wasm_bindgen(js_name = pickSaveFile)]
    fn js_pick_save_file(suggested_name: &str) -> Promise;
    #[wasm_bindgen(js_name = readHandleText)]
    fn js_read_handle_text(handle: &JsValue) -> Promise;
    #[wasm_bindgen(js_name = writeHandleText)]
    fn js_write_handle_text(handle: &JsValue, text: &str) -> Promise;
    #[wasm_bindgen(js_name = directoryEntryNames)]
    fn js_directory_entry_names(handle: &JsValue) -> Promise;
    #[wasm_bindgen(js_name = chooseInputFile)]
    fn js_choose_input_file() -> Promise;
}

/// Rejection reason of a JS promise, split into its DOM error name and message.
struct JsFailure {
    name: String,
    message: String,
}

impl From<JsValue> for JsFailure {
    fn from(err: JsValue) -> Self {
        let field = |key: &str| {
            Reflect::get(&err, &JsValue::from_str(key))
                .ok()
                .and_then(|value| value.as_string())
        };
        let message = err
            .as_string()
            .or_else(|| field("message"))
            .unwrap_or_else(|| format!("{err:?}"));
        Self {
            name: field("name").unwrap_or_default(),
            message,
        }
    }
}

impl From<JsFailure> for HostError {
    fn from(failure: JsFailure) -> Self {
        match failure.name.as_str() {
            "NotFoundError" => HostError::not_found(failure.message),
            "InvalidStateError" => HostError::not_initialized(failure.message),
            "NotSupportedError" => HostError::unsupported(failure.message),
            _ => HostError::backend(failure.message),
        }
    }
}

impl From<JsFailure> for PickerError {
    fn from(failure: JsFailure) -> Self {
        if failure.name == "AbortError" {
            PickerError::Cancelled
        } else {
            PickerError::Failed(failure.message)
        }
    }
}

async fn await_js(promise: Promise) -> Result<JsValue, JsFailure> {
    JsFuture::from(promise).await.map_err(JsFailure::from)
}

fn to_js(value: &Value) -> HostResult<JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| HostError::backend(err.to_string()))
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> HostResult<T> {
    from_value(value).map_err(|err| HostError::backend(err.to_string()))
}

fn has_property(target: &JsValue, key: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(key)).unwrap_or(false)
}

pub fn snapshot_runtime() -> RuntimeSnapshot {
    let Some(window) = web_sys::window() else {
        return RuntimeSnapshot::default();
    };
    let navigator = window.navigator();

    let desktop_bridge = Reflect::get(&window, &JsValue::from_str("electron"))
        .map(|value| value.is_truthy())
        .unwrap_or(false);
    let standalone_display = window
        .match_media("(display-mode: standalone)")
        .ok()
        .flatten()
        .map(|query| query.matches())
        .unwrap_or(false);

    RuntimeSnapshot {
        desktop_bridge,
        user_agent: navigator.user_agent().unwrap_or_default(),
        service_worker_api: has_property(&navigator, "serviceWorker"),
        file_picker_api: has_property(&window, "showOpenFilePicker"),
        notification_api: has_property(&window, "Notification"),
        standalone_display,
    }
}

pub fn page_origin() -> Option<String> {
    web_sys::window().and_then(|window| window.location().origin().ok())
}

pub(crate) fn spawn_detached<F>(_label: &str, future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub(crate) async fn idb_open(database: &str, version: u32, schema: &Value) -> HostResult<()> {
    await_js(js_idb_open(database, version, to_js(schema)?)).await?;
    Ok(())
}

pub(crate) fn idb_close(database: &str) {
    js_idb_close(database);
}

pub(crate) async fn idb_get_all(database: &str, store: &str) -> HostResult<Vec<Record>> {
    from_js(await_js(js_idb_get_all(database, store)).await?)
}

pub(crate) async fn idb_add(database: &str, store: &str, record: &Record) -> HostResult<()> {
    await_js(js_idb_add(database, store, to_js(record)?)).await?;
    Ok(())
}

pub(crate) async fn idb_put(database: &str, store: &str, record: &Record) -> HostResult<()> {
    await_js(js_idb_put(database, store, to_js(record)?)).await?;
    Ok(())
}

pub(crate) async fn idb_delete(database: &str, store: &str, key: &Value) -> HostResult<()> {
    await_js(js_idb_delete(database, store, to_js(key)?)).await?;
    Ok(())
}

/// Fire-and-forget POST that the browser keeps alive across page unloads.
///
/// Returns the status code and the JSON body, or `null` when the body is not JSON.
pub(crate) async fn post_keepalive(url: &str, payload: &Value) -> HostResult<(u16, Value)> {
    let failed = |err: JsValue| {
        HostError::transport(format!(
            "request to {url} failed: {}",
            JsFailure::from(err).message
        ))
    };
    let window =
        web_sys::window().ok_or_else(|| HostError::transport("no browser window available"))?;

    let headers = Headers::new().map_err(failed)?;
    headers
        .set("Content-Type", "application/json")
        .map_err(failed)?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_credentials(RequestCredentials::Include);
    init.set_keepalive(true);
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&payload.to_string()));

    let response: Response = JsFuture::from(window.fetch_with_str_and_init(url, &init))
        .await
        .map_err(failed)?
        .dyn_into()
        .map_err(failed)?;
    let body = match response.json() {
        Ok(promise) => JsFuture::from(promise)
            .await
            .ok()
            .and_then(|value| from_value::<Value>(value).ok())
            .unwrap_or(Value::Null),
        Err(_) => Value::Null,
    };
    Ok((response.status(), body))
}

fn handle_name(handle: &JsValue) -> String {
    Reflect::get(handle, &JsValue::from_str("name"))
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_default()
}

/// File handle granted by the File System Access API.
struct BrowserFileHandle {
    name: String,
    handle: JsValue,
}

impl BrowserFileHandle {
    fn shared(handle: JsValue) -> Rc<dyn FileAccessHandle> {
        Rc::new(Self {
            name: handle_name(&handle),
            handle,
        })
    }
}

impl FileAccessHandle for BrowserFileHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_text<'a>(&'a self) -> HandleFuture<'a, HostResult<String>> {
        Box::pin(async move { from_js(await_js(js_read_handle_text(&self.handle)).await?) })
    }

    fn write_text<'a>(&'a self, content: &'a str) -> HandleFuture<'a, HostResult<()>> {
        Box::pin(async move {
            await_js(js_write_handle_text(&self.handle, content)).await?;
            Ok(())
        })
    }
}

/// Directory handle granted by the File System Access API.
struct BrowserDirectoryHandle {
    name: String,
    handle: JsValue,
}

impl DirectoryAccessHandle for BrowserDirectoryHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn entry_names<'a>(&'a self) -> HandleFuture<'a, HostResult<Vec<String>>> {
        Box::pin(async move { from_js(await_js(js_directory_entry_names(&self.handle)).await?) })
    }
}

/// [`FileAccessPicker`] over `showOpenFilePicker`, `showDirectoryPicker`, and
/// `showSaveFilePicker`. Dismissing a picker reports [`PickerError::Cancelled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserFileAccessPicker;

impl FileAccessPicker for BrowserFileAccessPicker {
    fn pick_file<'a>(&'a self) -> HandleFuture<'a, Result<Rc<dyn FileAccessHandle>, PickerError>> {
        Box::pin(async move {
            let handle = await_js(js_pick_file()).await?;
            Ok(BrowserFileHandle::shared(handle))
        })
    }

    fn pick_directory<'a>(
        &'a self,
    ) -> HandleFuture<'a, Result<Rc<dyn DirectoryAccessHandle>, PickerError>> {
        Box::pin(async move {
            let handle = await_js(js_pick_directory()).await?;
            Ok(Rc::new(BrowserDirectoryHandle {
                name: handle_name(&handle),
                handle,
            }) as Rc<dyn DirectoryAccessHandle>)
        })
    }

    fn pick_save_file<'a>(
        &'a self,
        suggested_name: Option<&'a str>,
    ) -> HandleFuture<'a, Result<Rc<dyn FileAccessHandle>, PickerError>> {
        Box::pin(async move {
            let handle = await_js(js_pick_save_file(suggested_name.unwrap_or_default())).await?;
            Ok(BrowserFileHandle::shared(handle))
        })
    }
}

#[derive(Deserialize)]
struct ChosenInput {
    name: String,
    content: String,
}

/// [`FileInputSource`] over a transient, hidden `<input type="file">` element.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserFileInput;

impl FileInputSource for BrowserFileInput {
    fn choose_file<'a>(&'a self) -> FsFuture<'a, HostResult<Option<SelectedFile>>> {
        Box::pin(async move {
            let chosen: Option<ChosenInput> = from_js(await_js(js_choose_input_file()).await?)?;
            Ok(chosen.map(|ChosenInput { name, content }| SelectedFile { name, content }))
        })
    }
}

pub(crate) fn open_socket(url: String, channel: String, listener: ChannelListener) -> Subscription {
    let socket = match WebSocket::new(&url) {
        Ok(socket) => socket,
        Err(err) => {
            error!(channel = %channel, "WebSocket error: {err:?}");
            return Subscription::inert();
        }
    };

    let message_channel = channel.clone();
    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        match event.data().as_string() {
            Some(text) => deliver_frame(&message_channel, &text, &listener),
            None => error!(channel = %message_channel, "failed to parse socket message: non-text frame"),
        }
    });
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let on_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
        error!(channel = %channel, "WebSocket error: {err:?}");
    });
    socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    Subscription::new(move || {
        socket.set_onmessage(None);
        socket.set_onerror(None);
        let _ = socket.close();
        drop(on_message);
        drop(on_error);
    })
}

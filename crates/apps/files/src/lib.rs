//! Leptos file manager view: sign-in, upload, search/filter/sort, preview and delete.

pub mod view_model;

use leptos::*;
use vault_host::{
    AccountService, FileCatalog, FileRecord, FilterField, HostServices, SortOrder, VaultConfig,
};

use crate::view_model::{
    build_query, is_current_selection, listing, preview_content, row_details, PreviewContent,
};

#[derive(Clone)]
struct VaultContext {
    accounts: AccountService,
    username: RwSignal<Option<String>>,
    records: RwSignal<Vec<FileRecord>>,
    error: RwSignal<Option<String>>,
    busy: RwSignal<bool>,
}

impl VaultContext {
    fn catalog(&self) -> Option<FileCatalog> {
        self.username
            .get_untracked()
            .map(|username| self.accounts.catalog_for(&username))
    }

    fn report(&self, context: &str, err: impl std::fmt::Display) {
        log::warn!("{context}: {err}");
        self.error.set(Some(err.to_string()));
    }

    fn refresh(&self) {
        let Some(catalog) = self.catalog() else {
            self.records.set(Vec::new());
            return;
        };
        let ctx = self.clone();
        spawn_local(async move {
            match catalog.list_records().await {
                Ok(records) => ctx.records.set(records),
                Err(err) => ctx.report("loading records failed", err),
            }
        });
    }

    fn signed_in(&self, username: String) {
        self.error.set(None);
        self.username.set(Some(username));
        self.refresh();
    }
}

/// File manager bound to `services`.
#[component]
pub fn FileVaultApp(
    services: HostServices,
    #[prop(optional)] config: VaultConfig,
) -> impl IntoView {
    let ctx = VaultContext {
        accounts: services.accounts(&config),
        username: create_rw_signal(None),
        records: create_rw_signal(Vec::new()),
        error: create_rw_signal(None),
        busy: create_rw_signal(false),
    };
    let default_sort = config.view.default_sort;

    {
        let ctx = ctx.clone();
        spawn_local(async move {
            match ctx.accounts.restore_session().await {
                Ok(Some(account)) => ctx.signed_in(account.username),
                Ok(None) => {}
                Err(err) => ctx.report("restoring session failed", err),
            }
        });
    }

    let username = ctx.username;
    let error = ctx.error;
    let workspace_ctx = ctx.clone();

    view! {
        <div class="app-shell app-files-shell">
            <Show when=move || error.get().is_some() fallback=|| ()>
                <div class="files-error" role="alert">
                    <span>{move || error.get().unwrap_or_default()}</span>
                    <button type="button" on:click=move |_| error.set(None)>"Dismiss"</button>
                </div>
            </Show>
            <Show
                when=move || username.get().is_some()
                fallback=move || view! { <AuthPanel ctx=ctx.clone() /> }
            >
                <Workspace ctx=workspace_ctx.clone() default_sort=default_sort />
            </Show>
        </div>
    }
}

#[component]
fn AuthPanel(ctx: VaultContext) -> impl IntoView {
    let name = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let sign_up_mode = create_rw_signal(false);

    let submit = {
        let ctx = ctx.clone();
        move |_| {
            let ctx = ctx.clone();
            let (user, pass) = (name.get_untracked(), password.get_untracked());
            let creating = sign_up_mode.get_untracked();
            ctx.error.set(None);
            spawn_local(async move {
                let result = if creating {
                    ctx.accounts.sign_up(&user, &pass).await
                } else {
                    ctx.accounts.login(&user, &pass).await
                };
                match result {
                    Ok(account) => {
                        name.set(String::new());
                        password.set(String::new());
                        sign_up_mode.set(false);
                        ctx.signed_in(account.username);
                    }
                    Err(err) => ctx.error.set(Some(err.to_string())),
                }
            });
        }
    };

    view! {
        <form class="files-auth" on:submit=move |ev| ev.prevent_default()>
            <h1>{move || if sign_up_mode.get() { "Create account" } else { "Sign in" }}</h1>
            <label>
                "Username"
                <input
                    type="text"
                    autocomplete="username"
                    prop:value=move || name.get()
                    on:input=move |ev| name.set(event_target_value(&ev))
                />
            </label>
            <label>
                "Password"
                <input
                    type="password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
            </label>
            <button type="submit" on:click=submit>
                {move || if sign_up_mode.get() { "Sign up" } else { "Log in" }}
            </button>
            <button type="button" class="files-link" on:click=move |_| sign_up_mode.update(|v| *v = !*v)>
                {move || {
                    if sign_up_mode.get() {
                        "Already have an account? Sign in"
                    } else {
                        "No account? Sign up"
                    }
                }}
            </button>
        </form>
    }
}

#[component]
fn Workspace(ctx: VaultContext, default_sort: SortOrder) -> impl IntoView {
    let search = create_rw_signal(String::new());
    let filter_field = create_rw_signal(FilterField::Name);
    let filter_value = create_rw_signal(String::new());
    let sort = create_rw_signal(default_sort);
    let selected = create_rw_signal::<Option<FileRecord>>(None);
    let preview = create_rw_signal::<Option<PreviewContent>>(None);
    let pending_delete = create_rw_signal::<Option<FileRecord>>(None);

    let records = ctx.records;
    let busy = ctx.busy;
    let view_state = create_memo(move |_| {
        let query = build_query(
            &search.get(),
            filter_field.get(),
            &filter_value.get(),
            sort.get(),
        );
        records.with(|records| listing(records, &query))
    });

    let upload = {
        let ctx = ctx.clone();
        move |_| {
            let Some(catalog) = ctx.catalog() else {
                return;
            };
            let ctx = ctx.clone();
            busy.set(true);
            spawn_local(async move {
                let picked = match vault_host_web::pick_files(true).await {
                    Ok(picked) => picked,
                    Err(err) => {
                        busy.set(false);
                        ctx.report("file picker failed", err);
                        return;
                    }
                };
                if picked.is_empty() {
                    busy.set(false);
                    return;
                }
                let uploads = picked
                    .into_iter()
                    .map(vault_host_web::PickedFile::into_new_record)
                    .collect();
                if let Err(err) = catalog.add_records(uploads).await {
                    ctx.report("upload failed", err);
                }
                busy.set(false);
                ctx.refresh();
            });
        }
    };

    let open_preview = {
        let ctx = ctx.clone();
        Callback::new(move |record: FileRecord| {
            let Some(catalog) = ctx.catalog() else {
                return;
            };
            let ctx = ctx.clone();
            selected.set(Some(record.clone()));
            preview.set(None);
            spawn_local(async move {
                let result = catalog.read_bytes(&record.id).await;
                // Another row may have been opened while the bytes were loading.
                let still_open = selected
                    .with_untracked(|current| is_current_selection(current.as_ref(), &record.id));
                if !still_open {
                    return;
                }
                match result {
                    Ok(bytes) => preview.set(Some(preview_content(&record, bytes))),
                    Err(err) => ctx.report("preview failed", err),
                }
            });
        })
    };

    let confirm_delete = {
        let ctx = ctx.clone();
        move |_| {
            let (Some(record), Some(catalog)) = (pending_delete.get_untracked(), ctx.catalog())
            else {
                return;
            };
            pending_delete.set(None);
            let ctx = ctx.clone();
            spawn_local(async move {
                match catalog.delete_record(&record.id).await {
                    Ok(_) => {
                        let was_open = selected.with_untracked(|current| {
                            is_current_selection(current.as_ref(), &record.id)
                        });
                        if was_open {
                            selected.set(None);
                            preview.set(None);
                        }
                    }
                    Err(err) => ctx.report("delete failed", err),
                }
                ctx.refresh();
            });
        }
    };

    let logout = {
        let ctx = ctx.clone();
        move |_| {
            let ctx = ctx.clone();
            spawn_local(async move {
                if let Err(err) = ctx.accounts.logout().await {
                    ctx.report("logout failed", err);
                }
                ctx.username.set(None);
                ctx.records.set(Vec::new());
            });
        }
    };

    let username = ctx.username;

    view! {
        <div class="app-toolbar files-toolbar">
            <span class="files-user">{move || username.get().unwrap_or_default()}</span>
            <button type="button" on:click=upload disabled=move || busy.get()>
                {move || if busy.get() { "Uploading..." } else { "Upload" }}
            </button>
            <button type="button" on:click=logout>"Log out"</button>
        </div>

        <div class="files-controls">
            <input
                type="search"
                placeholder="Search by name or GR number"
                prop:value=move || search.get()
                on:input=move |ev| search.set(event_target_value(&ev))
            />
            <div class="files-chips" role="group" aria-label="Filter field">
                {FilterField::ALL
                    .into_iter()
                    .map(|field| view! {
                        <button
                            type="button"
                            class=move || if filter_field.get() == field { "chip selected" } else { "chip" }
                            on:click=move |_| filter_field.set(field)
                        >
                            {field.as_str()}
                        </button>
                    })
                    .collect_view()}
            </div>
            <input
                type="text"
                placeholder=move || filter_field.get().placeholder()
                prop:value=move || filter_value.get()
                on:input=move |ev| filter_value.set(event_target_value(&ev))
            />
            <div class="files-chips" role="group" aria-label="Sort order">
                {SortOrder::ALL
                    .into_iter()
                    .map(|order| view! {
                        <button
                            type="button"
                            class=move || if sort.get() == order { "chip selected" } else { "chip" }
                            on:click=move |_| sort.set(order)
                        >
                            {order.label()}
                        </button>
                    })
                    .collect_view()}
            </div>
        </div>

        <div class="files-summary">{move || view_state.with(|(_, summary)| summary.to_string())}</div>

        <div class="files-workspace">
            <ul class="files-list" aria-label="Files">
                <For
                    each=move || view_state.with(|(visible, _)| visible.clone())
                    key=|record| record.id.clone()
                    let:record
                >
                    <FileRow
                        record=record
                        selected=selected
                        on_open=open_preview
                        on_delete=Callback::new(move |record| pending_delete.set(Some(record)))
                    />
                </For>
            </ul>
            <PreviewPanel selected=selected preview=preview />
        </div>

        <Show when=move || pending_delete.get().is_some() fallback=|| ()>
            <div class="files-confirm" role="dialog" aria-modal="true">
                <p>
                    {move || {
                        pending_delete
                            .get()
                            .map(|record| format!("Delete \"{}\"? This cannot be undone.", record.display_name))
                            .unwrap_or_default()
                    }}
                </p>
                <button type="button" on:click=confirm_delete.clone()>"Delete"</button>
                <button type="button" on:click=move |_| pending_delete.set(None)>"Cancel"</button>
            </div>
        </Show>
    }
}

#[component]
fn FileRow(
    record: FileRecord,
    selected: RwSignal<Option<FileRecord>>,
    on_open: Callback<FileRecord>,
    on_delete: Callback<FileRecord>,
) -> impl IntoView {
    let id = record.id.clone();
    let is_selected = Signal::derive(move || {
        selected.with(|current| current.as_ref().map(|r| &r.id) == Some(&id))
    });
    let details = row_details(&record);
    let open_record = record.clone();
    let delete_record = record.clone();

    view! {
        <li class=move || if is_selected.get() { "files-row selected" } else { "files-row" }>
            <button type="button" class="files-open" on:click=move |_| on_open.call(open_record.clone())>
                <span class="files-glyph">{record.media.glyph()}</span>
                <span class="files-name">{record.display_name.clone()}</span>
                <span class="files-details">{details}</span>
            </button>
            <button
                type="button"
                class="files-delete"
                aria-label="Delete"
                on:click=move |_| on_delete.call(delete_record.clone())
            >
                "Delete"
            </button>
        </li>
    }
}

#[component]
fn PreviewPanel(
    selected: RwSignal<Option<FileRecord>>,
    preview: RwSignal<Option<PreviewContent>>,
) -> impl IntoView {
    let download = move |href: String| {
        let name = selected
            .get_untracked()
            .map(|record| record.display_name)
            .unwrap_or_else(|| "download".to_string());
        if let Err(err) = vault_host_web::trigger_download(&name, &href) {
            log::warn!("download failed: {err}");
        }
    };

    view! {
        <aside class="files-preview" aria-label="Preview">
            {move || match (selected.get(), preview.get()) {
                (None, _) => view! {
                    <div class="details-empty">"Select a file to preview it."</div>
                }.into_view(),
                (Some(record), None) => view! {
                    <div class="details-empty">{format!("Loading {}...", record.display_name)}</div>
                }.into_view(),
                (Some(record), Some(content)) => {
                    let body = match content {
                        PreviewContent::Image(src) => view! { <img src=src alt=record.display_name.clone() /> }.into_view(),
                        PreviewContent::Video(src) => view! { <video controls=true src=src></video> }.into_view(),
                        PreviewContent::Audio(src) => view! { <audio controls=true src=src></audio> }.into_view(),
                        PreviewContent::Pdf(src) => view! { <iframe class="files-pdf" src=src title=record.display_name.clone()></iframe> }.into_view(),
                        PreviewContent::Text(text) => view! { <pre class="files-text">{text}</pre> }.into_view(),
                        PreviewContent::Download { href, reason } => view! {
                            <div class="files-download">
                                <p>{reason}</p>
                                <button type="button" on:click=move |_| download(href.clone())>"Download"</button>
                            </div>
                        }.into_view(),
                        PreviewContent::Unavailable => view! {
                            <div class="details-empty">"No stored bytes for this file."</div>
                        }.into_view(),
                    };
                    view! {
                        <div class="details-grid">
                            <div>"Name"</div><div>{record.display_name.clone()}</div>
                            <div>"Details"</div><div>{row_details(&record)}</div>
                        </div>
                        {body}
                    }.into_view()
                }
            }}
        </aside>
    }
}

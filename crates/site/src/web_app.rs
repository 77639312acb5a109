use leptos::*;
use leptos_meta::*;
use vault_app_files::FileVaultApp;
use vault_host::VaultConfig;
use vault_host_web::web_host_services;

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="GR Vault" />
        <Meta name="description" content="Personal file manager with GR serial numbers." />

        <main class="site-root">
            <FileVaultApp services=web_host_services() config=VaultConfig::default() />
        </main>
    }
}

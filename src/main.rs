//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use inspecao_backend::{
    app::build_router,
    config::{AppState, Settings},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG sobrepõe o nível padrão)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    if let Some(pool) = &app_state.db_pool {
        sqlx::migrate!()
            .run(pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados.")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", settings.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}

// src/services/report/photos.rs

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use reqwest::{redirect::Policy, Url};

/// Teto do corpo de uma foto remota.
pub const MAX_PHOTO_BYTES: usize = 15 * 1024 * 1024;

/// Resolve referências de imagem (`data:` ou http/https) para imagens decodificadas.
/// Falhas nunca interrompem o relatório: a imagem é omitida e registrada em log.
///
/// URLs remotas só são baixadas quando começam pela base configurada
/// (`REPORT_PHOTO_BASE_URL`). Sem base, nenhuma URL remota é aceita.
#[derive(Clone)]
pub struct PhotoLoader {
    client: reqwest::Client,
    allowed_base: Option<Url>,
    max_bytes: usize,
}

impl Default for PhotoLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PhotoLoader {
    pub fn new(allowed_base: Option<Url>) -> Self {
        // redirecionamento poderia sair da base permitida
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(Policy::none())
            .build()
            .unwrap_or_default();
        Self { client, allowed_base, max_bytes: MAX_PHOTO_BYTES }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub async fn load(&self, reference: &str) -> Option<DynamicImage> {
        let reference = reference.trim();
        let bytes = if reference.starts_with("data:") {
            decode_data_url(reference)
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            self.fetch(reference).await
        } else {
            tracing::warn!(reference = %preview(reference), "Referência de imagem não suportada");
            None
        }?;

        match image::load_from_memory(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!(reference = %preview(reference), "Imagem inválida: {}", e);
                None
            }
        }
    }

    /// Mesmo esquema, host e porta da base, e caminho abaixo do dela.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let Some(base) = &self.allowed_base else {
            return false;
        };
        url.scheme() == base.scheme()
            && url.host_str() == base.host_str()
            && url.port_or_known_default() == base.port_or_known_default()
            && url.username().is_empty()
            && url.password().is_none()
            && url.path().starts_with(base.path())
    }

    async fn fetch(&self, raw: &str) -> Option<Vec<u8>> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %preview(raw), "URL de imagem inválida: {}", e);
                return None;
            }
        };
        if !self.is_allowed(&url) {
            tracing::warn!(url = %url, "URL de imagem fora da base permitida");
            return None;
        }

        let mut response = match self.client.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, "Falha ao baixar imagem: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "Falha ao baixar imagem");
            return None;
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes as u64 {
                tracing::warn!(url = %url, bytes = declared, "Imagem excede o tamanho máximo");
                return None;
            }
        }

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > self.max_bytes {
                        tracing::warn!(url = %url, "Imagem excede o tamanho máximo");
                        return None;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => return Some(body),
                Err(e) => {
                    tracing::warn!(url = %url, "Falha ao ler imagem: {}", e);
                    return None;
                }
            }
        }
    }
}

/// Decodifica `data:<mime>;base64,<dados>`.
pub fn decode_data_url(reference: &str) -> Option<Vec<u8>> {
    let Some((meta, payload)) = reference.split_once(',') else {
        tracing::warn!(reference = %preview(reference), "Data URL sem separador");
        return None;
    };
    if !meta.ends_with(";base64") {
        tracing::warn!(reference = %preview(reference), "Data URL não está em base64");
        return None;
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(payload) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(reference = %preview(reference), "Base64 inválido: {}", e);
            None
        }
    }
}

// data URLs são enormes; no log vai só o começo
fn preview(reference: &str) -> String {
    reference.chars().take(48).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn decodes_base64_data_url() {
        let encoded = format!("data:text/plain;base64,{}", STANDARD.encode(b"ola"));
        assert_eq!(decode_data_url(&encoded), Some(b"ola".to_vec()));
    }

    #[test]
    fn rejects_malformed_data_urls() {
        assert_eq!(decode_data_url("data:image/png;base64"), None);
        assert_eq!(decode_data_url("data:image/png,cru"), None);
        assert_eq!(decode_data_url("data:image/png;base64,@@@"), None);
    }

    #[tokio::test]
    async fn unsupported_reference_is_none() {
        let loader = PhotoLoader::default();
        assert!(loader.load("ftp://exemplo/foto.jpg").await.is_none());
        assert!(loader.load("data:image/png;base64,AAAA").await.is_none());
    }

    fn loader_for(base: &str) -> PhotoLoader {
        PhotoLoader::new(Some(Url::parse(base).unwrap()))
    }

    #[test]
    fn only_urls_under_the_base_are_allowed() {
        let loader = loader_for("https://fotos.exemplo.com.br/inspecoes/");
        let allowed = |raw: &str| loader.is_allowed(&Url::parse(raw).unwrap());

        assert!(allowed("https://fotos.exemplo.com.br/inspecoes/os-1/foto.jpg"));
        assert!(!allowed("https://fotos.exemplo.com.br/outros/foto.jpg"));
        assert!(!allowed("http://fotos.exemplo.com.br/inspecoes/foto.jpg"));
        assert!(!allowed("https://fotos.exemplo.com.br:8443/inspecoes/foto.jpg"));
        assert!(!allowed("https://fotos.exemplo.com.br.evil.io/inspecoes/foto.jpg"));
        assert!(!allowed("https://user@fotos.exemplo.com.br/inspecoes/foto.jpg"));
        assert!(!allowed("http://169.254.169.254/latest/meta-data/"));
    }

    #[test]
    fn without_base_no_remote_url_is_allowed() {
        let loader = PhotoLoader::default();
        assert!(!loader.is_allowed(&Url::parse("https://fotos.exemplo.com.br/a.jpg").unwrap()));
    }

    // Servidor HTTP de uma resposta só; devolve a base e se houve conexão
    async fn serve_once(response: Vec<u8>) -> (String, tokio::task::JoinHandle<bool>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let accepted = tokio::time::timeout(Duration::from_millis(500), listener.accept()).await;
            let Ok(Ok((mut socket, _))) = accepted else {
                return false;
            };
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
            true
        });
        (base, handle)
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn http_ok(body: &[u8]) -> Vec<u8> {
        let mut response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len())
            .into_bytes();
        response.extend_from_slice(body);
        response
    }

    #[tokio::test]
    async fn disallowed_host_is_not_fetched() {
        let (base, server) = serve_once(http_ok(&png_bytes())).await;
        let loader = loader_for("https://fotos.exemplo.com.br/");

        assert!(loader.load(&format!("{base}foto.png")).await.is_none());
        assert!(!server.await.unwrap(), "nenhuma conexão deveria ser aberta");
    }

    #[tokio::test]
    async fn photo_under_the_base_is_fetched() {
        let (base, server) = serve_once(http_ok(&png_bytes())).await;
        let loader = loader_for(&base);

        let img = loader.load(&format!("{base}os-1/foto.png")).await;
        assert_eq!(img.map(|i| (i.width(), i.height())), Some((4, 4)));
        assert!(server.await.unwrap());
    }

    #[tokio::test]
    async fn declared_length_over_the_cap_is_rejected() {
        let (base, _server) = serve_once(http_ok(&png_bytes())).await;
        let loader = loader_for(&base).with_max_bytes(16);

        assert!(loader.load(&format!("{base}foto.png")).await.is_none());
    }

    #[tokio::test]
    async fn chunked_body_over_the_cap_is_rejected() {
        let body = png_bytes();
        let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
        for part in body.chunks(8) {
            response.extend_from_slice(format!("{:x}\r\n", part.len()).as_bytes());
            response.extend_from_slice(part);
            response.extend_from_slice(b"\r\n");
        }
        response.extend_from_slice(b"0\r\n\r\n");

        let (base, _server) = serve_once(response).await;
        let loader = loader_for(&base).with_max_bytes(16);

        assert!(loader.load(&format!("{base}foto.png")).await.is_none());
    }
}

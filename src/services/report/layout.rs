// src/services/report/layout.rs
//
// Diagramação do relatório em pontos (A4 = 595 x 842), independente do PDF.
// Coordenadas com origem no canto superior esquerdo; `y` de texto é a linha de base.

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 48.0;
pub const BOTTOM_MARGIN: f32 = 64.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN * 2.0;

const LOGO_MAX: (f32, f32) = (140.0, 48.0);
const PHOTO_MAX: (f32, f32) = (180.0, 120.0);
const PHOTOS_PER_ROW: usize = 2;
const PHOTO_GAP: f32 = 16.0;
const SIGNATURE_SIZE: (f32, f32) = (100.0, 40.0);
const SIGNATURE_BLOCK_HEIGHT: f32 = 150.0;

const TITLE_LINE_HEIGHT: f32 = 14.0;
const RESULT_LINE_HEIGHT: f32 = 16.0;
const OBSERVATION_LINE_HEIGHT: f32 = 12.0;
const OBSERVATION_GAP: f32 = 6.0;
const PHOTO_ROW_GAP: f32 = 10.0;
const ROW_GAP: f32 = 8.0;

pub const EMPTY_VALUE: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const OLIVE: Rgb = Rgb(130, 130, 60);
    pub const GREY: Rgb = Rgb(120, 120, 120);
    pub const RULE: Rgb = Rgb(210, 210, 210);
    pub const SIGNATURE_LINE: Rgb = Rgb(60, 60, 60);
}

/// Imagem já carregada: índice no vetor de imagens do relatório e tamanho natural em pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlot {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        size: u8,
        weight: FontWeight,
        color: Rgb,
        align: Align,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
    },
    /// `x`/`y` é o canto superior esquerdo.
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = usize> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { index, .. } => Some(*index),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutDocument {
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// --- Entrada ---

/// Textos fixos já traduzidos.
#[derive(Debug, Clone)]
pub struct ReportLabels {
    pub title: String,
    pub work_order_number: String,
    pub client_name: String,
    pub technician_name: String,
    pub completed_at: String,
    pub checklist_heading: String,
    pub issued_at: String,
    pub technician_signature: String,
    pub client_signature: String,
    /// Modelo com `{page}` e `{total}`.
    pub page_footer: String,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutRow {
    /// "<id> - <descrição>".
    pub title: String,
    /// Linha completa, ex.: "Resultado: Conforme".
    pub result_line: String,
    /// Linha completa, ex.: "Observação: vazamento".
    pub observation: Option<String>,
    pub photos: Vec<ImageSlot>,
}

#[derive(Debug, Clone, Default)]
pub struct SignatureSlot {
    pub image: Option<ImageSlot>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LayoutInput {
    pub labels: ReportLabels,
    pub logo: Option<ImageSlot>,
    pub work_order_number: Option<String>,
    pub client_name: Option<String>,
    pub technician_name: Option<String>,
    /// Data de conclusão já formatada.
    pub completed_at: Option<String>,
    pub issued_at: String,
    pub rows: Vec<LayoutRow>,
    pub technician: SignatureSlot,
    pub client: SignatureSlot,
}

// --- Métrica de texto ---

/// Larguras de glifo no estilo Helvética (unidades de 1/1000 em).
/// É determinística: a quebra de linha não depende da fonte instalada.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMetrics;

impl TextMetrics {
    pub fn text_width(&self, text: &str, size: f32, weight: FontWeight) -> f32 {
        let units: u32 = text.chars().map(glyph_units).sum();
        let factor = match weight {
            FontWeight::Regular => 1.0,
            FontWeight::Bold => 1.06,
        };
        units as f32 * size / 1000.0 * factor
    }
}

fn glyph_units(c: char) -> u32 {
    match fold_diacritic(c) {
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | '[' | '\\' | ']' | 'I' | 'f' | 't' => 278,
        '"' => 355,
        '\'' => 191,
        '(' | ')' | '-' | '`' | 'r' => 333,
        '*' => 389,
        '+' | '<' | '=' | '>' | '~' => 584,
        '%' => 889,
        '&' | 'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        '@' => 1015,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'w' => 722,
        'F' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'J' | 'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        'L' => 556,
        'M' | 'm' => 833,
        'W' => 944,
        '^' => 469,
        'i' | 'j' | 'l' => 222,
        '{' | '}' => 334,
        '|' => 260,
        '—' => 1000,
        '°' | 'º' | 'ª' => 400,
        _ => 556,
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'ê' | 'è' => 'e',
        'É' | 'Ê' | 'È' => 'E',
        'í' | 'ì' => 'i',
        'Í' | 'Ì' => 'I',
        'ó' | 'ô' | 'õ' | 'ò' => 'o',
        'Ó' | 'Ô' | 'Õ' | 'Ò' => 'O',
        'ú' | 'ü' | 'ù' => 'u',
        'Ú' | 'Ü' | 'Ù' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Quebra o texto em linhas que cabem em `max_width`. Respeita `\n`.
/// Palavras maiores que a linha são cortadas por caractere. Sempre devolve ao menos uma linha.
pub fn wrap_text(metrics: &TextMetrics, text: &str, max_width: f32, size: f32, weight: FontWeight) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if metrics.text_width(&candidate, size, weight) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            // palavra sozinha maior que a linha
            for c in word.chars() {
                current.push(c);
                if metrics.text_width(&current, size, weight) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Encaixa `w x h` em `max_w x max_h` mantendo a proporção (arredondado).
/// Dimensão zero ocupa a caixa inteira.
pub fn fit_rect(w: f32, h: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    if w <= 0.0 || h <= 0.0 {
        return (max_w, max_h);
    }
    let ratio = (max_w / w).min(max_h / h);
    ((w * ratio).round(), (h * ratio).round())
}

// --- Diagramação ---

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self { pages: vec![Page::default()], y: 0.0 }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Abre nova página quando `need` não cabe acima da margem inferior.
    /// Página recém-aberta não quebra de novo (bloco maior que a página).
    fn ensure_space(&mut self, need: f32) {
        if self.y + need > PAGE_HEIGHT - BOTTOM_MARGIN && self.y > MARGIN {
            self.pages.push(Page::default());
            self.y = MARGIN;
        }
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, size: u8, weight: FontWeight) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            size,
            weight,
            color: Rgb::BLACK,
            align: Align::Left,
        });
    }
}

pub fn lay_out(input: &LayoutInput, metrics: &TextMetrics) -> LaidOutDocument {
    let mut cursor = Cursor::new();
    let labels = &input.labels;

    // ===== Cabeçalho =====
    let top = 36.0;
    if let Some(logo) = input.logo {
        let (w, h) = fit_rect(logo.width as f32, logo.height as f32, LOGO_MAX.0, LOGO_MAX.1);
        cursor.push(DrawOp::Image { index: logo.index, x: MARGIN, y: top, width: w, height: h });
    }

    // título centralizado verticalmente em top + 22
    cursor.push(DrawOp::Text {
        x: PAGE_WIDTH / 2.0,
        y: top + 22.0 + 18.0 * 0.35,
        text: labels.title.clone(),
        size: 18,
        weight: FontWeight::Bold,
        color: Rgb::BLACK,
        align: Align::Center,
    });

    let rule_y = top + 60.0;
    cursor.push(DrawOp::Line { from: (MARGIN, rule_y), to: (PAGE_WIDTH - MARGIN, rule_y), color: Rgb::RULE });

    // ===== Identificação =====
    let mut y = rule_y + 20.0;
    let fields = [
        (&labels.work_order_number, input.work_order_number.as_deref()),
        (&labels.client_name, input.client_name.as_deref()),
        (&labels.technician_name, input.technician_name.as_deref()),
        (&labels.completed_at, input.completed_at.as_deref()),
    ];
    for (pos, (label, value)) in fields.into_iter().enumerate() {
        if pos > 0 {
            y += 18.0;
        }
        cursor.text(MARGIN, y, label.as_str(), 12, FontWeight::Bold);
        let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(EMPTY_VALUE);
        cursor.text(MARGIN + 160.0, y, value, 12, FontWeight::Regular);
    }

    // ===== Checklist =====
    y += 28.0;
    cursor.text(MARGIN, y, labels.checklist_heading.as_str(), 14, FontWeight::Bold);
    cursor.y = y + 14.0;

    for row in &input.rows {
        lay_out_row(&mut cursor, row, metrics);
    }

    // ===== Data e assinaturas =====
    lay_out_signatures(&mut cursor, input);

    // ===== Rodapé =====
    let total = cursor.pages.len();
    for (pos, page) in cursor.pages.iter_mut().enumerate() {
        let text = labels
            .page_footer
            .replace("{page}", &(pos + 1).to_string())
            .replace("{total}", &total.to_string());
        page.ops.push(DrawOp::Text {
            x: PAGE_WIDTH - 48.0,
            y: PAGE_HEIGHT - 24.0,
            text,
            size: 10,
            weight: FontWeight::Regular,
            color: Rgb::GREY,
            align: Align::Right,
        });
    }

    LaidOutDocument { pages: cursor.pages }
}

fn lay_out_row(cursor: &mut Cursor, row: &LayoutRow, metrics: &TextMetrics) {
    let title = row.title.trim();
    let title = if title.is_empty() { EMPTY_VALUE } else { title };
    let title_lines = wrap_text(metrics, title, CONTENT_WIDTH, 11.0, FontWeight::Bold);
    let observation_lines = row
        .observation
        .as_deref()
        .map(|obs| wrap_text(metrics, obs, CONTENT_WIDTH, 11.0, FontWeight::Regular))
        .unwrap_or_default();

    let photos: Vec<(ImageSlot, f32, f32)> = row
        .photos
        .iter()
        .map(|slot| {
            let (w, h) = fit_rect(slot.width as f32, slot.height as f32, PHOTO_MAX.0, PHOTO_MAX.1);
            (*slot, w, h)
        })
        .collect();

    let mut need = title_lines.len() as f32 * TITLE_LINE_HEIGHT + RESULT_LINE_HEIGHT;
    if !observation_lines.is_empty() {
        need += observation_lines.len() as f32 * OBSERVATION_LINE_HEIGHT + OBSERVATION_GAP;
    }
    for chunk in photos.chunks(PHOTOS_PER_ROW) {
        need += chunk.iter().map(|(_, _, h)| *h).fold(0.0, f32::max) + PHOTO_ROW_GAP;
    }

    cursor.ensure_space(need);

    for (pos, line) in title_lines.iter().enumerate() {
        let y = cursor.y + pos as f32 * TITLE_LINE_HEIGHT;
        cursor.text(MARGIN, y, line.as_str(), 11, FontWeight::Bold);
    }
    cursor.y += title_lines.len() as f32 * TITLE_LINE_HEIGHT;

    let y = cursor.y;
    cursor.text(MARGIN, y, row.result_line.as_str(), 11, FontWeight::Regular);
    cursor.y += RESULT_LINE_HEIGHT;

    if !observation_lines.is_empty() {
        for (pos, line) in observation_lines.iter().enumerate() {
            cursor.push(DrawOp::Text {
                x: MARGIN,
                y: cursor.y + pos as f32 * OBSERVATION_LINE_HEIGHT,
                text: line.clone(),
                size: 11,
                weight: FontWeight::Regular,
                color: Rgb::OLIVE,
                align: Align::Left,
            });
        }
        cursor.y += observation_lines.len() as f32 * OBSERVATION_LINE_HEIGHT + OBSERVATION_GAP;
    }

    for chunk in photos.chunks(PHOTOS_PER_ROW) {
        let row_height = chunk.iter().map(|(_, _, h)| *h).fold(0.0, f32::max);
        // cada linha de fotos confere o espaço de novo
        cursor.ensure_space(row_height + PHOTO_ROW_GAP);
        let mut x = MARGIN;
        for (slot, w, h) in chunk {
            cursor.push(DrawOp::Image { index: slot.index, x, y: cursor.y, width: *w, height: *h });
            x += w + PHOTO_GAP;
        }
        cursor.y += row_height + PHOTO_ROW_GAP;
    }

    cursor.y += ROW_GAP;
}

fn lay_out_signatures(cursor: &mut Cursor, input: &LayoutInput) {
    let labels = &input.labels;
    cursor.ensure_space(SIGNATURE_BLOCK_HEIGHT);
    let y = cursor.y;

    cursor.text(MARGIN, y, labels.issued_at.as_str(), 12, FontWeight::Bold);
    cursor.text(MARGIN + 100.0, y, input.issued_at.as_str(), 12, FontWeight::Regular);

    let zone_y = y + 40.0;
    let col_gap = 24.0;
    let col_width = (CONTENT_WIDTH - col_gap) / 2.0;

    let columns = [
        (MARGIN, &input.technician, &labels.technician_signature),
        (MARGIN + col_width + col_gap, &input.client, &labels.client_signature),
    ];
    for (x, slot, caption) in columns {
        match slot.image {
            Some(image) => cursor.push(DrawOp::Image {
                index: image.index,
                x,
                y: zone_y,
                width: SIGNATURE_SIZE.0,
                height: SIGNATURE_SIZE.1,
            }),
            None => cursor.push(DrawOp::Line {
                from: (x, zone_y + 36.0),
                to: (x + col_width, zone_y + 36.0),
                color: Rgb::SIGNATURE_LINE,
            }),
        }

        let caption = match slot.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => format!("{caption}: {name}"),
            None => caption.clone(),
        };
        cursor.text(x, zone_y + 52.0, caption, 11, FontWeight::Regular);
    }

    cursor.y = zone_y + 52.0;
}

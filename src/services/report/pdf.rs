// src/services/report/pdf.rs
//
// Desenha um `LaidOutDocument` com o genpdf. Cada página diagramada vira um
// elemento próprio que pinta em coordenadas absolutas.

use std::sync::Arc;

use genpdf::{
    elements, render,
    style::{Color, Style},
    Context, Element, Mm, Position, RenderResult, Scale,
};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageBuffer, Rgb as RgbPixel};

use crate::{
    common::error::AppError,
    services::report::layout::{Align, DrawOp, FontWeight, LaidOutDocument, Page, Rgb},
};

const PT_TO_MM: f64 = 0.3528;
const IMAGE_DPI: f64 = 300.0;

/// Pasta e família das fontes TrueType (`<família>-Regular.ttf`, `-Bold.ttf`, ...).
#[derive(Debug, Clone)]
pub struct FontSettings {
    pub dir: String,
    pub family: String,
}

fn mm(pt: f32) -> Mm {
    Mm::from(f64::from(pt) * PT_TO_MM)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// O PDF não aceita canal alfa: compõe sobre fundo branco.
pub fn flatten_alpha(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let rgba = img.to_rgba8();
    let (w, h) = img.dimensions();
    let flat = ImageBuffer::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        RgbPixel([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flat)
}

/// Reduz a imagem ao tamanho da caixa diagramada a `IMAGE_DPI`. Nunca amplia.
pub fn fit_for_print(img: &DynamicImage, width_pt: f32, height_pt: f32) -> DynamicImage {
    let max_w = (f64::from(width_pt) / 72.0 * IMAGE_DPI).ceil().max(1.0) as u32;
    let max_h = (f64::from(height_pt) / 72.0 * IMAGE_DPI).ceil().max(1.0) as u32;
    let (w, h) = img.dimensions();
    let flat = flatten_alpha(img);
    if w <= max_w && h <= max_h {
        return flat;
    }
    flat.resize(max_w, max_h, FilterType::Triangle)
}

enum CanvasOp {
    Text {
        position: (f32, f32),
        text: String,
        style: Style,
        align: Align,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        style: Style,
    },
    Image(elements::Image),
}

/// Uma página diagramada. Sempre ocupa a área inteira e nunca continua.
struct PageCanvas {
    ops: Vec<CanvasOp>,
}

impl PageCanvas {
    fn build(page: &Page, images: &[Arc<DynamicImage>]) -> Result<Self, AppError> {
        let mut ops = Vec::with_capacity(page.ops.len());

        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, size, weight, color: rgb, align } => {
                    let mut style = Style::new().with_font_size(*size).with_color(color(*rgb));
                    if *weight == FontWeight::Bold {
                        style = style.bold();
                    }
                    ops.push(CanvasOp::Text { position: (*x, *y), text: text.clone(), style, align: *align });
                }
                DrawOp::Line { from, to, color: rgb } => {
                    // o genpdf 0.2 só usa a cor do estilo no traço
                    let style = Style::new().with_color(color(*rgb));
                    ops.push(CanvasOp::Line { from: *from, to: *to, style });
                }
                DrawOp::Image { index, x, y, width, height } => {
                    let Some(source) = images.get(*index) else {
                        tracing::warn!(index = *index, "Imagem ausente na diagramação");
                        continue;
                    };
                    if source.width() == 0 || source.height() == 0 {
                        continue;
                    }
                    let printable = fit_for_print(source, *width, *height);
                    // tamanho natural a 300 dpi, em mm
                    let natural_mm = f64::from(printable.width()) * 25.4 / IMAGE_DPI;
                    let scale = f64::from(*width) * PT_TO_MM / natural_mm;

                    let image = elements::Image::from_dynamic_image(printable)
                        .map_err(|e| AppError::RenderError(e.to_string()))?
                        .with_dpi(IMAGE_DPI)
                        .with_scale(Scale::new(scale, scale))
                        .with_position(Position::new(mm(*x), mm(*y)));
                    ops.push(CanvasOp::Image(image));
                }
            }
        }

        Ok(Self { ops })
    }
}

impl Element for PageCanvas {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        for op in &mut self.ops {
            match op {
                CanvasOp::Text { position, text, style, align } => {
                    let width = style.str_width(&context.font_cache, text);
                    let ascent = style.font(&context.font_cache).glyph_height(style.font_size());
                    let x = match align {
                        Align::Left => mm(position.0),
                        Align::Center => mm(position.0) - width / 2.0,
                        Align::Right => mm(position.0) - width,
                    };
                    // genpdf posiciona pelo topo da linha; a diagramação usa a linha de base
                    let top = mm(position.1) - ascent;
                    area.print_str(&context.font_cache, Position::new(x, top), *style, text.as_str())?;
                }
                CanvasOp::Line { from, to, style } => {
                    area.draw_line(
                        vec![
                            Position::new(mm(from.0), mm(from.1)),
                            Position::new(mm(to.0), mm(to.1)),
                        ],
                        *style,
                    );
                }
                CanvasOp::Image(image) => {
                    image.render(context, area.clone(), Style::new())?;
                }
            }
        }

        Ok(RenderResult { size: area.size(), has_more: false })
    }
}

/// Gera os bytes do PDF. Qualquer falha de fonte ou do motor aborta sem saída parcial.
pub fn render_pdf(
    document: &LaidOutDocument,
    images: &[Arc<DynamicImage>],
    fonts: &FontSettings,
    title: &str,
) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(&fonts.dir, &fonts.family, None).map_err(|e| {
        AppError::FontNotFound(format!("{}/{}: {}", fonts.dir, fonts.family, e))
    })?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    doc.set_paper_size(genpdf::PaperSize::A4);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(0);
    doc.set_page_decorator(decorator);

    for (pos, page) in document.pages.iter().enumerate() {
        if pos > 0 {
            doc.push(elements::PageBreak::new());
        }
        doc.push(PageCanvas::build(page, images)?);
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|e| AppError::RenderError(e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{RgbImage, Rgba, RgbaImage};

    #[test]
    fn transparent_pixels_become_white() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let flat = flatten_alpha(&DynamicImage::ImageRgba8(img)).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn large_photos_are_reduced_to_their_box() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4000, 3000));
        // 160 x 120 pt a 300 dpi
        let printable = fit_for_print(&img, 160.0, 120.0);
        let (w, h) = printable.dimensions();
        assert!(w <= 667 && h <= 500, "{w}x{h}");
        assert!(w >= 660 && h >= 495, "{w}x{h}");
    }

    #[test]
    fn small_photos_keep_their_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(400, 300));
        let printable = fit_for_print(&img, 160.0, 120.0);
        assert_eq!(printable.dimensions(), (400, 300));
        assert!(!printable.color().has_alpha());
    }

    #[test]
    fn missing_fonts_are_reported() {
        let fonts = FontSettings { dir: "./nao-existe".into(), family: "Roboto".into() };
        let result = render_pdf(&LaidOutDocument::default(), &[], &fonts, "x");
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}

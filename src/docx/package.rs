use super::{
    Alignment, Block, Body, Document, ImageFormat, ListKind, Paragraph, Picture, Run,
    RunContent, RunFormat, Table,
};
use crate::error::Result;
use std::collections::BTreeSet;
use std::io::{Seek, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const EMU_PER_INCH: f64 = 914_400.0;
const TWIPS_PER_INCH: f64 = 1440.0;
// Letter page minus 1in margins on both sides.
const TEXT_WIDTH_TWIPS: usize = 9360;
const MAX_LIST_LEVEL: u32 = 8;
const FIRST_MEDIA_RID: usize = 10;

fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

struct MediaEntry<'a> {
    rid: String,
    file_name: String,
    picture: &'a Picture,
}

/// Collects pictures (assigning relationship ids and media names in document order) and
/// whether numbering is needed, while the body XML is produced.
#[derive(Default)]
struct XmlCtx<'a> {
    media: Vec<MediaEntry<'a>>,
    has_lists: bool,
}

impl<'a> XmlCtx<'a> {
    fn register(&mut self, picture: &'a Picture) -> (usize, String) {
        let n = self.media.len() + 1;
        let rid = format!("rId{}", FIRST_MEDIA_RID + self.media.len());
        self.media.push(MediaEntry {
            rid: rid.clone(),
            file_name: format!("image{n}.{}", picture.format.extension()),
            picture,
        });
        (n, rid)
    }

    fn formats(&self) -> BTreeSet<&'static str> {
        self.media.iter().map(|m| m.picture.format.extension()).collect()
    }
}

fn run_properties_xml(style: &RunFormat) -> String {
    if style.is_plain() {
        return String::new();
    }
    let mut out = String::from("<w:rPr>");
    if style.bold {
        out.push_str("<w:b/>");
    }
    if style.italic {
        out.push_str("<w:i/>");
    }
    if style.strike {
        out.push_str("<w:strike/>");
    }
    if let Some(color) = style.color {
        out.push_str(&format!("<w:color w:val=\"{}\"/>", color.hex()));
    }
    if let Some(sz) = style.size_half_points {
        out.push_str(&format!("<w:sz w:val=\"{sz}\"/><w:szCs w:val=\"{sz}\"/>"));
    }
    if style.highlight {
        out.push_str("<w:highlight w:val=\"yellow\"/>");
    }
    if style.underline {
        out.push_str("<w:u w:val=\"single\"/>");
    }
    if style.superscript {
        out.push_str("<w:vertAlign w:val=\"superscript\"/>");
    } else if style.subscript {
        out.push_str("<w:vertAlign w:val=\"subscript\"/>");
    }
    out.push_str("</w:rPr>");
    out
}

fn text_run_xml(text: &str, style: &RunFormat) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::from("<w:r>");
    out.push_str(&run_properties_xml(style));
    let mut first = true;
    for line in text.split('\n') {
        if !first {
            out.push_str("<w:br/>");
        }
        first = false;
        if !line.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&xml_escape_text(line));
            out.push_str("</w:t>");
        }
    }
    out.push_str("</w:r>");
    out
}

fn picture_run_xml(n: usize, rid: &str, picture: &Picture) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="{n}" name="image{n}.{ext}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        cx = picture.width,
        cy = picture.height,
        ext = picture.format.extension(),
    )
}

fn run_xml<'a>(run: &'a Run, ctx: &mut XmlCtx<'a>) -> String {
    match &run.content {
        RunContent::Text(text) => text_run_xml(text, &run.format),
        RunContent::Picture(picture) => {
            let (n, rid) = ctx.register(picture);
            picture_run_xml(n, &rid, picture)
        }
    }
}

fn paragraph_xml<'a>(p: &'a Paragraph, ctx: &mut XmlCtx<'a>) -> String {
    let mut out = String::new();
    out.push_str("<w:p>");

    let has_props = p.list.is_some() || p.left_indent.is_some() || p.alignment != Alignment::Left;
    if has_props {
        out.push_str("<w:pPr>");
        if let Some(list) = p.list {
            ctx.has_lists = true;
            let (style_id, num_id) = match list.kind {
                ListKind::Bullet => ("ListBullet", 1),
                ListKind::Number => ("ListNumber", 2),
            };
            out.push_str(&format!("<w:pStyle w:val=\"{style_id}\"/>"));
            out.push_str("<w:numPr>");
            out.push_str(&format!(
                "<w:ilvl w:val=\"{}\"/>",
                list.level.min(MAX_LIST_LEVEL)
            ));
            out.push_str(&format!("<w:numId w:val=\"{num_id}\"/>"));
            out.push_str("</w:numPr>");
        }
        if let Some(indent) = p.left_indent {
            let twips = (indent * TWIPS_PER_INCH).round() as i64;
            out.push_str(&format!("<w:ind w:left=\"{twips}\"/>"));
        }
        match p.alignment {
            Alignment::Left => {}
            Alignment::Center => out.push_str("<w:jc w:val=\"center\"/>"),
            Alignment::Right => out.push_str("<w:jc w:val=\"right\"/>"),
            Alignment::Justify => out.push_str("<w:jc w:val=\"both\"/>"),
        }
        out.push_str("</w:pPr>");
    }

    for run in &p.runs {
        out.push_str(&run_xml(run, ctx));
    }

    out.push_str("</w:p>");
    out
}

fn table_xml<'a>(t: &'a Table, ctx: &mut XmlCtx<'a>) -> String {
    let col_width = TEXT_WIDTH_TWIPS / t.cols.max(1);

    let mut out = String::new();
    out.push_str("<w:tbl>");
    out.push_str("<w:tblPr>");
    out.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>");
    out.push_str(
        r#"<w:tblBorders>
<w:top w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:left w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:bottom w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:right w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:insideH w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
<w:insideV w:val="single" w:sz="4" w:space="0" w:color="D9D9D9"/>
</w:tblBorders>"#,
    );
    out.push_str("</w:tblPr>");

    out.push_str("<w:tblGrid>");
    for _ in 0..t.cols {
        out.push_str(&format!("<w:gridCol w:w=\"{col_width}\"/>"));
    }
    out.push_str("</w:tblGrid>");

    for row in &t.rows {
        out.push_str("<w:tr>");
        for cell in row {
            out.push_str("<w:tc>");
            out.push_str(&format!(
                "<w:tcPr><w:tcW w:w=\"{col_width}\" w:type=\"dxa\"/></w:tcPr>"
            ));
            out.push_str(&body_xml(&cell.body, ctx));
            // A cell must end with a paragraph or readers report a corrupt file.
            if !matches!(cell.body.blocks.last(), Some(Block::Paragraph(_))) {
                out.push_str("<w:p/>");
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }

    out.push_str("</w:tbl>");
    out
}

fn body_xml<'a>(body: &'a Body, ctx: &mut XmlCtx<'a>) -> String {
    let mut out = String::new();
    for b in &body.blocks {
        match b {
            Block::Paragraph(p) => out.push_str(&paragraph_xml(p, ctx)),
            Block::Table(t) => out.push_str(&table_xml(t, ctx)),
        }
    }
    out
}

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:wpc="http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas"
 xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
 xmlns:o="urn:schemas-microsoft-com:office:office"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
 xmlns:v="urn:schemas-microsoft-com:vml"
 xmlns:wp14="http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing"
 xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
 xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
 xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"
 xmlns:w10="urn:schemas-microsoft-com:office:word"
 xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
 xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordprocessingml"
 xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordprocessingml"
 xmlns:wpg="http://schemas.microsoft.com/office/word/2010/wordprocessingGroup"
 xmlns:wpi="http://schemas.microsoft.com/office/word/2010/wordprocessingInk"
 xmlns:wne="http://schemas.microsoft.com/office/word/2006/wordml"
 xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"
 mc:Ignorable="w14 w15 wp14">
  <w:body>
    {body}
    <w:sectPr>
      <w:pgSz w:w="12240" w:h="15840"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>
      <w:cols w:space="708"/>
      <w:docGrid w:linePitch="360"/>
    </w:sectPr>
  </w:body>
</w:document>"#
    )
}

fn content_types_xml(has_numbering: bool, image_exts: &BTreeSet<&'static str>) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push('\n');
    out.push_str(
        r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push('\n');
    out.push_str(r#"  <Default Extension="xml" ContentType="application/xml"/>"#);
    out.push('\n');
    for ext in image_exts {
        let content_type = match *ext {
            "png" => ImageFormat::Png.content_type(),
            "gif" => ImageFormat::Gif.content_type(),
            "bmp" => ImageFormat::Bmp.content_type(),
            _ => ImageFormat::Jpeg.content_type(),
        };
        out.push_str(&format!(
            r#"  <Default Extension="{ext}" ContentType="{content_type}"/>"#
        ));
        out.push('\n');
    }
    out.push_str(r#"  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    out.push('\n');
    if has_numbering {
        out.push_str(r#"  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>"#);
        out.push('\n');
    }
    out.push_str("</Types>");
    out
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
}

fn document_rels_xml(has_numbering: bool, media: &[MediaEntry<'_>]) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    out.push('\n');
    if has_numbering {
        out.push_str(r#"  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>"#);
        out.push('\n');
    }
    for m in media {
        out.push_str(&format!(
            r#"  <Relationship Id="{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{name}"/>"#,
            rid = m.rid,
            name = m.file_name,
        ));
        out.push('\n');
    }
    out.push_str("</Relationships>");
    out
}

fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListBullet">
    <w:name w:val="List Bullet"/>
    <w:basedOn w:val="Normal"/>
    <w:uiPriority w:val="99"/>
    <w:pPr>
      <w:numPr><w:numId w:val="1"/></w:numPr>
      <w:contextualSpacing/>
    </w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListNumber">
    <w:name w:val="List Number"/>
    <w:basedOn w:val="Normal"/>
    <w:uiPriority w:val="99"/>
    <w:pPr>
      <w:numPr><w:numId w:val="2"/></w:numPr>
      <w:contextualSpacing/>
    </w:pPr>
  </w:style>
</w:styles>"#
}

fn numbering_xml() -> String {
    let levels = |fmt: &str, text: &dyn Fn(u32) -> String| {
        (0..=MAX_LIST_LEVEL)
            .map(|ilvl| {
                format!(
                    r#"    <w:lvl w:ilvl="{ilvl}"><w:start w:val="1"/><w:numFmt w:val="{fmt}"/><w:lvlText w:val="{}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="{}" w:hanging="360"/></w:pPr></w:lvl>"#,
                    text(ilvl),
                    720 * (ilvl + 1),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="1">
    <w:multiLevelType w:val="hybridMultilevel"/>
{bullets}
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="2">
    <w:multiLevelType w:val="hybridMultilevel"/>
{decimals}
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="1"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="2"/></w:num>
</w:numbering>"#,
        bullets = levels("bullet", &|_| "\u{2022}".to_string()),
        decimals = levels("decimal", &|ilvl| format!("%{}.", ilvl + 1)),
    )
}

pub(super) fn write_docx<W: Write + Seek>(doc: &Document, writer: W) -> Result<()> {
    let mut ctx = XmlCtx::default();
    let body = body_xml(&doc.body, &mut ctx);
    let doc_xml = document_xml(&body);
    write_parts(writer, &doc_xml, &ctx)?;
    Ok(())
}

fn write_parts<W: Write + Seek>(writer: W, doc_xml: &str, ctx: &XmlCtx<'_>) -> ZipResult<()> {
    let mut zip = ZipWriter::new(writer);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(content_types_xml(ctx.has_lists, &ctx.formats()).as_bytes())?;

    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(rels_xml().as_bytes())?;

    zip.start_file("word/document.xml", opts)?;
    zip.write_all(doc_xml.as_bytes())?;

    zip.start_file("word/styles.xml", opts)?;
    zip.write_all(styles_xml().as_bytes())?;

    if ctx.has_lists {
        zip.start_file("word/numbering.xml", opts)?;
        zip.write_all(numbering_xml().as_bytes())?;
    }

    zip.start_file("word/_rels/document.xml.rels", opts)?;
    zip.write_all(document_rels_xml(ctx.has_lists, &ctx.media).as_bytes())?;

    for m in &ctx.media {
        zip.start_file(format!("word/media/{}", m.file_name), opts)?;
        zip.write_all(&m.picture.data)?;
    }

    zip.finish()?;
    Ok(())
}

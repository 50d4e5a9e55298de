use crate::geometry::{ImageSize, Segment};
use crate::scale::{px, ScaleBar};
use std::path::Path;

/// Horizontal anchor of the bar as a fraction of the image width.
pub const GOLDEN_RATIO_X: f64 = 0.618;
/// Vertical anchor of the bar as a fraction of the image height.
pub const BAR_Y: f64 = 0.9;
/// Default shadow offset, in image pixels.
pub const DEFAULT_SHADOW: u32 = 4;

/// Everything the emitted document depends on.
pub struct Overlay<'a> {
    pub image: &'a Path,
    pub size: ImageSize,
    pub reference: Segment,
    pub bar: &'a ScaleBar,
    /// Offset of the dark shadow bar; `None` draws the white bar only.
    pub shadow: Option<u32>,
}

/// Generates a standalone LaTeX/TikZ document that draws the scale bar on top
/// of the image.
///
/// The picture uses image pixels as its coordinate system (`y` pointing down),
/// so every length below is written in pixels and scaled to `\linewidth` by
/// `\imagescale`.
pub fn generate_tex(overlay: &Overlay) -> String {
    let w = overlay.size.width;
    let h = overlay.size.height;
    let bar = overlay.bar;
    let anchor_x = px(f64::from(w) * GOLDEN_RATIO_X);
    let anchor_y = px(f64::from(h) * BAR_Y);
    let bar_px = px(bar.scale_bar_px);
    let target = bar.settings.target_um;
    let item = bar.settings.item_length_px;
    let scale_mm = bar.scale_mm;
    let chosen = px(bar.chosen_length_px);
    let unit = px(bar.unit_length_um);
    let hundred = px(bar.per_hundred_px);

    let r = overlay.reference;
    let (sx, sy, ex, ey) = (px(r.start.x), px(r.start.y), px(r.end.x), px(r.end.y));

    let absolute = tex_path(
        &std::path::absolute(overlay.image).unwrap_or_else(|_| overlay.image.to_path_buf()),
    );
    let relative = tex_path(&overlay.image.with_extension(""));

    let (shadow_def, shadow_bar) = match overlay.shadow {
        Some(shadow) => (
            format!("\\def\\shadow{{{shadow}}}% shadow parameter for scalebar\n"),
            format!(
                "    \\draw[|-|,thick] (\\x+\\shadow,\\y+\\shadow) -- (\\x+{bar_px}+\\shadow,\\y+\\shadow) node [midway, above] {{\\SI{{{target}}}{{\\micro\\meter}}}};\n"
            ),
        ),
        None => (String::new(), String::new()),
    };

    format!(
        r#"\documentclass{{article}}
\usepackage{{graphicx}}
\usepackage{{tikz}}
\usepackage{{siunitx}}
\usepackage[graphics,tightpage,active]{{preview}}
    \PreviewEnvironment{{tikzpicture}}
\newcommand{{\imsize}}{{\linewidth}}
\newlength\imagewidth % needed for scalebars
\newlength\imagescale % ditto
\begin{{document}}%
%-------------
\pgfmathsetlength{{\imagewidth}}{{\imsize}}%
\pgfmathsetlength{{\imagescale}}{{\imagewidth/{w}}}%
\def\x{{{anchor_x}}}% scalebar-x starting at golden ratio of image width of {w}px = {anchor_x}
\def\y{{{anchor_y}}}% scalebar-y at 90% of image height of {h}px = {anchor_y}
{shadow_def}\begin{{tikzpicture}}[x=\imagescale,y=-\imagescale]
    \clip (0,0) rectangle ({w},{h});
    %\node[anchor=north west, inner sep=0pt, outer sep=0pt] at (0,0) {{\includegraphics[width=\imagewidth]{{{absolute}}}}};
    \node[anchor=north west, inner sep=0pt, outer sep=0pt] at (0,0) {{\includegraphics[width=\imagewidth]{{{relative}}}}};
    % {chosen}px = {scale_mm}mm > {item}px = {unit}um > {bar_px}px = {target}um, {hundred}px = 100um
    %\draw[|-|,blue,thick] ({sx},{sy}) -- ({ex},{ey}) node [sloped,midway,above,fill=white,semitransparent,text opacity=1] {{\SI{{{scale_mm}}}{{\milli\meter}} ({chosen}px) TEMPORARY!}};
{shadow_bar}    \draw[|-|,white,thick] (\x,\y) -- (\x+{bar_px},\y) node [midway,above] {{\SI{{{target}}}{{\micro\meter}}}};
    %\draw[color=red, anchor=south west] (0,{h}) node [fill=white, semitransparent] {{Legend}} node {{Legend}};
\end{{tikzpicture}}%
%-------------
\end{{document}}%
"#
    )
}

/// LaTeX wants forward slashes even on Windows.
fn tex_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::scale::ScaleSettings;

    fn micrograph() -> (ImageSize, ScaleBar) {
        let size = ImageSize {
            width: 1024,
            height: 1014,
        };
        let bar = ScaleBar::compute(1024.0, 1024.0, 2.8, ScaleSettings::default()).unwrap();
        (size, bar)
    }

    #[test]
    fn places_bar_at_golden_ratio_and_ninety_percent() {
        let (size, bar) = micrograph();
        let tex = generate_tex(&Overlay {
            image: Path::new("data/rec.png"),
            size,
            reference: Segment::full_width(size),
            bar: &bar,
            shadow: Some(DEFAULT_SHADOW),
        });

        assert!(tex.starts_with("\\documentclass{article}\n"));
        assert!(tex.contains("\\pgfmathsetlength{\\imagescale}{\\imagewidth/1024}%\n"));
        assert!(tex.contains("\\def\\x{633}% scalebar-x starting at golden ratio of image width of 1024px = 633\n"));
        assert!(tex.contains("\\def\\y{913}% scalebar-y at 90% of image height of 1014px = 913\n"));
        assert!(tex.contains("\\def\\shadow{4}%"));
        assert!(tex.contains("    \\clip (0,0) rectangle (1024,1014);\n"));
        assert!(tex.contains("{\\includegraphics[width=\\imagewidth]{data/rec}};\n"));
        assert!(tex.contains(
            "    \\draw[|-|,white,thick] (\\x,\\y) -- (\\x+179,\\y) node [midway,above] {\\SI{500}{\\micro\\meter}};\n"
        ));
        assert!(tex.contains(
            "    \\draw[|-|,thick] (\\x+\\shadow,\\y+\\shadow) -- (\\x+179+\\shadow,\\y+\\shadow)"
        ));
        assert!(tex.ends_with("\\end{tikzpicture}%\n%-------------\n\\end{document}%\n"));
        assert_eq!(tex.lines().count(), 28);
        assert!(tex.lines().all(|line| !line.trim().is_empty()));
    }

    #[test]
    fn reference_line_and_summary_are_commented_out() {
        let (size, bar) = micrograph();
        let tex = generate_tex(&Overlay {
            image: Path::new("rec.png"),
            size,
            reference: Segment::new(Point::new(10.4, 20.6), Point::new(1000.5, 20.0)),
            bar: &bar,
            shadow: Some(DEFAULT_SHADOW),
        });

        assert!(tex.contains(&format!(
            "    % 1024px = {}mm > 100px = 280um > 179px = 500um, 36px = 100um\n",
            bar.scale_mm
        )));
        assert!(tex.contains("    %\\draw[|-|,blue,thick] (10,21) -- (1001,20) node"));
        assert!(tex.contains("TEMPORARY!};\n"));
        assert!(tex.contains("    %\\draw[color=red, anchor=south west] (0,1014)"));
    }

    #[test]
    fn without_shadow_only_the_white_bar_is_drawn() {
        let (size, bar) = micrograph();
        let tex = generate_tex(&Overlay {
            image: Path::new("rec.png"),
            size,
            reference: Segment::full_width(size),
            bar: &bar,
            shadow: None,
        });
        assert!(!tex.contains("\\shadow"));
        assert_eq!(tex.lines().count(), 26);
        assert_eq!(tex.matches("\\draw[|-|,white,thick]").count(), 1);
        assert!(!tex.contains("\\draw[|-|,thick]"));
    }

    #[test]
    fn custom_target_changes_label() {
        let size = ImageSize {
            width: 2560,
            height: 2160,
        };
        let settings = ScaleSettings {
            target_um: 200.0,
            ..ScaleSettings::default()
        };
        let bar = ScaleBar::compute(2170.0, 2170.0, 0.65, settings).unwrap();
        let tex = generate_tex(&Overlay {
            image: Path::new("3d.jpg"),
            size,
            reference: Segment::full_width(size),
            bar: &bar,
            shadow: Some(2),
        });
        assert!(tex.contains("\\SI{200}{\\micro\\meter}"));
        assert!(tex.contains("(\\x+308,\\y)"));
    }
}

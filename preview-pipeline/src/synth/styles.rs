//! Styles-only strategy: a static sample page under the stylesheet, ready
//! as soon as it loads.

use super::{style_tags, Document, Strategy, Synthesizer};
use crate::file::VirtualFile;

const SAMPLE: &str = r##"<div id="root">
<main>
  <h1>Heading</h1>
  <p>Paragraph text with a <a href="#">link</a> and <strong>strong</strong> words.</p>
  <ul><li>First item</li><li>Second item</li></ul>
  <form><label>Field <input type="text" placeholder="Input"></label> <button type="button">Button</button></form>
</main>
</div>"##;

const TRAILER: &str = r#"<script>
(function () {
  if (!document.getElementById('root')) {
    window.__preview.fail(new Error('mount point not found'));
    return;
  }
  window.__preview.ready();
})();
</script>"#;

pub(super) fn build(synth: &Synthesizer, files: &[VirtualFile]) -> Document {
    let styles = style_tags(files);
    if styles.is_empty() {
        return Document::empty();
    }
    let entry = files.iter().find(|f| super::is_stylesheet(f)).map(|f| f.name.clone());
    Document {
        strategy: Strategy::StylesOnly,
        html: synth.shell(&styles, &format!("{SAMPLE}\n{TRAILER}")),
        entry,
        patches: Vec::new(),
    }
}

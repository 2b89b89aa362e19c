//! Built-in icon and widget stand-ins.
//!
//! Generated snippets routinely reference icon and UI-kit components from
//! packages the preview cannot install. The catalog binds lightweight
//! versions of the common ones onto `window` so those references resolve.
//! A user declaration of the same name shadows the stand-in.

use crate::escape::js_string_literal;

/// What a polyfill stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyfillKind {
    Icon,
    Widget,
}

/// One global binding: `name` and the JS expression that produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polyfill {
    pub name: String,
    pub kind: PolyfillKind,
    pub expr: String,
}

/// Versioned table of polyfills handed to the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyfillCatalog {
    pub version: u32,
    entries: Vec<Polyfill>,
}

pub const STANDARD_VERSION: u32 = 1;

/// Icon name -> SVG path data on a 24x24 stroke grid.
const ICONS: &[(&str, &[&str])] = &[
    ("Check", &["M20 6 9 17l-5-5"]),
    ("X", &["M18 6 6 18", "m6 6 12 12"]),
    ("Plus", &["M5 12h14", "M12 5v14"]),
    ("Minus", &["M5 12h14"]),
    ("Search", &["M11 3a8 8 0 1 0 0 16a8 8 0 1 0 0-16z", "m21 21-4.3-4.3"]),
    ("Menu", &["M4 6h16", "M4 12h16", "M4 18h16"]),
    ("ChevronDown", &["m6 9 6 6 6-6"]),
    ("ChevronUp", &["m18 15-6-6-6 6"]),
    ("ChevronLeft", &["m15 18-6-6 6-6"]),
    ("ChevronRight", &["m9 18 6-6-6-6"]),
    ("ArrowRight", &["M5 12h14", "m12 5 7 7-7 7"]),
    ("ArrowLeft", &["m12 19-7-7 7-7", "M19 12H5"]),
    (
        "Heart",
        &["M19 14c1.49-1.46 3-3.21 3-5.5A5.5 5.5 0 0 0 16.5 3c-1.76 0-3 .5-4.5 2-1.5-1.5-2.74-2-4.5-2A5.5 5.5 0 0 0 2 8.5c0 2.3 1.5 4.05 3 5.5l7 7Z"],
    ),
    (
        "Star",
        &["M12 2l3.09 6.26L22 9.27l-5 4.87 1.18 6.88L12 17.77l-6.18 3.25L7 14.14 2 9.27l6.91-1.01L12 2z"],
    ),
    (
        "Trash2",
        &[
            "M3 6h18",
            "M19 6v14c0 1-1 2-2 2H7c-1 0-2-1-2-2V6",
            "M8 6V4c0-1 1-2 2-2h4c1 0 2 1 2 2v2",
        ],
    ),
    ("Edit", &["M12 20h9", "M16.5 3.5a2.1 2.1 0 0 1 3 3L7 19l-4 1 1-4Z"]),
    (
        "Settings",
        &[
            "M12 15a3 3 0 1 0 0-6a3 3 0 1 0 0 6z",
            "M19.4 15a1.7 1.7 0 0 0 .3 1.8l.1.1a2 2 0 1 1-2.8 2.8l-.1-.1a1.7 1.7 0 0 0-1.8-.3 1.7 1.7 0 0 0-1 1.5V21a2 2 0 1 1-4 0v-.1a1.7 1.7 0 0 0-1.1-1.5 1.7 1.7 0 0 0-1.8.3l-.1.1a2 2 0 1 1-2.8-2.8l.1-.1a1.7 1.7 0 0 0 .3-1.8 1.7 1.7 0 0 0-1.5-1H3a2 2 0 1 1 0-4h.1a1.7 1.7 0 0 0 1.5-1.1 1.7 1.7 0 0 0-.3-1.8l-.1-.1a2 2 0 1 1 2.8-2.8l.1.1a1.7 1.7 0 0 0 1.8.3H9a1.7 1.7 0 0 0 1-1.5V3a2 2 0 1 1 4 0v.1a1.7 1.7 0 0 0 1 1.5 1.7 1.7 0 0 0 1.8-.3l.1-.1a2 2 0 1 1 2.8 2.8l-.1.1a1.7 1.7 0 0 0-.3 1.8V9a1.7 1.7 0 0 0 1.5 1H21a2 2 0 1 1 0 4h-.1a1.7 1.7 0 0 0-1.5 1z",
        ],
    ),
    (
        "User",
        &["M19 21v-2a4 4 0 0 0-4-4H9a4 4 0 0 0-4 4v2", "M12 3a4 4 0 1 0 0 8a4 4 0 1 0 0-8z"],
    ),
    ("Home", &["m3 9 9-7 9 7v11a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2z", "M9 22V12h6v10"]),
    (
        "Mail",
        &["M4 4h16c1.1 0 2 .9 2 2v12c0 1.1-.9 2-2 2H4c-1.1 0-2-.9-2-2V6c0-1.1.9-2 2-2z", "m22 6-10 7L2 6"],
    ),
    ("Bell", &["M6 8a6 6 0 0 1 12 0c0 7 3 9 3 9H3s3-2 3-9", "M10.3 21a1.94 1.94 0 0 0 3.4 0"]),
    (
        "Calendar",
        &["M3 6a2 2 0 0 1 2-2h14a2 2 0 0 1 2 2v14a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2z", "M16 2v4", "M8 2v4", "M3 10h18"],
    ),
    (
        "Sun",
        &[
            "M12 8a4 4 0 1 0 0 8a4 4 0 1 0 0-8z",
            "M12 2v2",
            "M12 20v2",
            "m4.93 4.93 1.41 1.41",
            "m17.66 17.66 1.41 1.41",
            "M2 12h2",
            "M20 12h2",
        ],
    ),
    ("Moon", &["M12 3a6 6 0 0 0 9 9 9 9 0 1 1-9-9Z"]),
    ("Loader2", &["M21 12a9 9 0 1 1-6.219-8.56"]),
];

/// Widget name -> (element, base classes).
const WIDGETS: &[(&str, &str, &str)] = &[
    ("Input", "input", "flex h-10 w-full rounded-md border border-slate-300 bg-white px-3 py-2 text-sm focus:outline-none focus:ring-2 focus:ring-slate-400"),
    ("Textarea", "textarea", "flex min-h-[80px] w-full rounded-md border border-slate-300 bg-white px-3 py-2 text-sm focus:outline-none focus:ring-2 focus:ring-slate-400"),
    ("Label", "label", "text-sm font-medium leading-none"),
    ("Badge", "span", "inline-flex items-center rounded-full border px-2.5 py-0.5 text-xs font-semibold"),
    ("Card", "div", "rounded-lg border border-slate-200 bg-white text-slate-900 shadow-sm"),
    ("CardHeader", "div", "flex flex-col space-y-1.5 p-6"),
    ("CardTitle", "h3", "text-2xl font-semibold leading-none tracking-tight"),
    ("CardDescription", "p", "text-sm text-slate-500"),
    ("CardContent", "div", "p-6 pt-0"),
    ("CardFooter", "div", "flex items-center p-6 pt-0"),
];

const BUTTON: &str = r#"(function () {
  var variants = {
    default: 'bg-slate-900 text-white hover:bg-slate-800',
    destructive: 'bg-red-600 text-white hover:bg-red-500',
    outline: 'border border-slate-300 bg-white hover:bg-slate-100',
    secondary: 'bg-slate-100 text-slate-900 hover:bg-slate-200',
    ghost: 'hover:bg-slate-100',
    link: 'text-slate-900 underline-offset-4 hover:underline'
  };
  var sizes = { default: 'h-10 px-4 py-2', sm: 'h-9 px-3', lg: 'h-11 px-8', icon: 'h-10 w-10' };
  return function Button(props) {
    var p = Object.assign({}, props);
    var variant = variants[p.variant] || variants.default;
    var size = sizes[p.size] || sizes.default;
    delete p.variant; delete p.size; delete p.asChild;
    p.className = __cx('inline-flex items-center justify-center gap-2 rounded-md text-sm font-medium transition-colors disabled:pointer-events-none disabled:opacity-50', variant, size, props.className);
    return React.createElement('button', p);
  };
})()"#;

/// Helpers the catalog entries are written against.
const HELPERS: &str = r#"function __cx() {
  return Array.prototype.filter.call(arguments, Boolean).join(' ');
}
function __makeIcon(name, paths) {
  var Icon = function (props) {
    var p = Object.assign({}, props);
    var size = p.size || 24;
    delete p.size;
    var attrs = Object.assign({
      xmlns: 'http://www.w3.org/2000/svg', width: size, height: size, viewBox: '0 0 24 24',
      fill: 'none', stroke: 'currentColor', strokeWidth: 2, strokeLinecap: 'round', strokeLinejoin: 'round'
    }, p);
    return React.createElement.apply(null, ['svg', attrs].concat(paths.map(function (d, i) {
      return React.createElement('path', { key: i, d: d });
    })));
  };
  Icon.displayName = name;
  return Icon;
}
function __slot(name, tag, base) {
  var Slot = function (props) {
    var p = Object.assign({}, props);
    p.className = __cx(base, props.className);
    return React.createElement(tag, p);
  };
  Slot.displayName = name;
  return Slot;
}"#;

impl PolyfillCatalog {
    /// Catalog with no entries.
    pub fn empty() -> Self {
        Self {
            version: STANDARD_VERSION,
            entries: Vec::new(),
        }
    }

    /// The built-in icon and widget set.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        for (name, paths) in ICONS {
            let list: Vec<String> = paths.iter().map(|d| js_string_literal(d)).collect();
            catalog.insert(Polyfill {
                name: (*name).to_string(),
                kind: PolyfillKind::Icon,
                expr: format!("__makeIcon({}, [{}])", js_string_literal(name), list.join(", ")),
            });
        }
        catalog.insert(Polyfill {
            name: "Button".to_string(),
            kind: PolyfillKind::Widget,
            expr: BUTTON.to_string(),
        });
        for (name, tag, classes) in WIDGETS {
            catalog.insert(Polyfill {
                name: (*name).to_string(),
                kind: PolyfillKind::Widget,
                expr: format!(
                    "__slot({}, {}, {})",
                    js_string_literal(name),
                    js_string_literal(tag),
                    js_string_literal(classes)
                ),
            });
        }
        catalog
    }

    /// Add or replace an entry by name.
    pub fn insert(&mut self, polyfill: Polyfill) {
        match self.entries.iter_mut().find(|p| p.name == polyfill.name) {
            Some(slot) => *slot = polyfill,
            None => self.entries.push(polyfill),
        }
    }

    pub fn without(mut self, name: &str) -> Self {
        self.entries.retain(|p| p.name != name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Script body binding every entry onto `window`, leaving existing
    /// globals alone.
    pub fn render(&self) -> String {
        let mut js = format!("/* polyfills v{} */\n{HELPERS}\n", self.version);
        for p in &self.entries {
            let key = js_string_literal(&p.name);
            js.push_str(&format!("if (!({key} in window)) window[{key}] = {};\n", p.expr));
        }
        js
    }
}

impl Default for PolyfillCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

use serde_json::Value;

use super::{ClassMap, EmissionMode};

const DEV_PRELUDE: &str = r#"class _MissingClassError extends Error {
  constructor(namespace, name) {
    super(`${namespace}.${name} is undefined`);
    this.name = "MissingClassError";
    this.namespace = namespace;
    this.key = name;
  }
}

const _accessor = (namespace, classes) => {
  const has = (name) => Object.prototype.hasOwnProperty.call(classes, name);
  const get = (name) => {
    if (!has(name)) throw new _MissingClassError(namespace, name);
    return classes[name];
  };
  const cx = (...args) => {
    const lists = [];
    for (const arg of args) {
      if (typeof arg === "string") {
        lists.push(get(arg));
      } else if (arg != null) {
        for (const [name, enabled] of Object.entries(arg)) {
          if (enabled) lists.push(get(name));
        }
      }
    }
    return lists.filter((list) => list !== "").join(" ");
  };
  return Object.freeze({ get, has, cx, classes: Object.freeze({ ...classes }) });
};
"#;

/// Render the class map as an ES module with one export per namespace.
pub fn render_module(map: &ClassMap, mode: EmissionMode) -> String {
  let mut out = String::new();

  if mode == EmissionMode::Dev {
    out.push_str(DEV_PRELUDE);
    out.push('\n');
  }

  for namespace in map.namespaces() {
    let object = object_literal(map, namespace);
    match mode {
      EmissionMode::Plain => {
        out.push_str(&format!("export const {} = {};\n", namespace, object));
      }
      EmissionMode::Dev => {
        out.push_str(&format!(
          "export const {} = _accessor({}, {});\n",
          namespace,
          string_literal(namespace),
          object
        ));
      }
    }
  }

  out
}

fn object_literal(map: &ClassMap, namespace: &str) -> String {
  let entries: Vec<String> = map
    .entries(namespace)
    .map(|(name, classes)| format!("  {}: {}", string_literal(name), string_literal(&classes)))
    .collect();

  if entries.is_empty() {
    return "{}".to_string();
  }

  format!("{{\n{}\n}}", entries.join(",\n"))
}

fn string_literal(value: &str) -> String {
  Value::String(value.to_string()).to_string()
}

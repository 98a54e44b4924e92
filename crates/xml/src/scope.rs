use kwire_envelope::token::XML_NAMESPACE;

/// Stack of per-element prefix bindings. The empty prefix is the default namespace; binding it
/// to `""` undeclares it.
#[derive(Debug, Default)]
pub(crate) struct Scopes {
	frames: Vec<Vec<(String, String)>>,
}

impl Scopes {
	pub(crate) fn push(&mut self, declarations: Vec<(String, String)>) {
		self.frames.push(declarations);
	}

	pub(crate) fn pop(&mut self) {
		self.frames.pop();
	}

	pub(crate) fn depth(&self) -> usize {
		self.frames.len()
	}

	/// Adds a binding to the innermost frame.
	pub(crate) fn declare(&mut self, prefix: &str, namespace: &str) {
		if let Some(frame) = self.frames.last_mut() {
			frame.push((prefix.to_string(), namespace.to_string()));
		}
	}

	/// Bindings of the innermost frame.
	pub(crate) fn current(&self) -> &[(String, String)] {
		self.frames.last().map_or(&[][..], Vec::as_slice)
	}

	pub(crate) fn resolve(&self, prefix: &str) -> Option<&str> {
		if prefix == "xml" {
			return Some(XML_NAMESPACE);
		}
		self.frames
			.iter()
			.rev()
			.flat_map(|frame| frame.iter().rev())
			.find(|(p, _)| p == prefix)
			.map(|(_, ns)| ns.as_str())
	}

	/// A prefix currently bound to `namespace`, skipping bindings shadowed by inner frames.
	/// With `allow_default` false the default namespace is never returned.
	pub(crate) fn prefix_for(&self, namespace: &str, allow_default: bool) -> Option<&str> {
		if namespace == XML_NAMESPACE {
			return Some("xml");
		}
		self.frames
			.iter()
			.rev()
			.flat_map(|frame| frame.iter().rev())
			.filter(|(prefix, ns)| ns == namespace && (allow_default || !prefix.is_empty()))
			.map(|(prefix, _)| prefix.as_str())
			.find(|prefix| self.resolve(prefix) == Some(namespace))
	}

	/// A fresh `nsN` prefix not bound in any frame.
	pub(crate) fn generate(&self, counter: &mut usize) -> String {
		loop {
			let candidate = format!("ns{counter}");
			*counter += 1;
			if self.resolve(&candidate).is_none() {
				return candidate;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inner_bindings_shadow_outer() {
		let mut scopes = Scopes::default();
		scopes.push(vec![("a".into(), "urn:one".into())]);
		scopes.push(vec![("a".into(), "urn:two".into())]);
		assert_eq!(scopes.resolve("a"), Some("urn:two"));
		assert_eq!(scopes.prefix_for("urn:one", true), None);
		scopes.pop();
		assert_eq!(scopes.prefix_for("urn:one", true), Some("a"));
	}

	#[test]
	fn default_namespace_is_not_an_attribute_prefix() {
		let mut scopes = Scopes::default();
		scopes.push(vec![(String::new(), "urn:d".into())]);
		assert_eq!(scopes.prefix_for("urn:d", true), Some(""));
		assert_eq!(scopes.prefix_for("urn:d", false), None);
	}

	#[test]
	fn generated_prefixes_skip_bound_names() {
		let mut scopes = Scopes::default();
		scopes.push(vec![("ns0".into(), "urn:taken".into())]);
		let mut counter = 0;
		assert_eq!(scopes.generate(&mut counter), "ns1");
		assert_eq!(scopes.resolve("xml"), Some(XML_NAMESPACE));
	}
}

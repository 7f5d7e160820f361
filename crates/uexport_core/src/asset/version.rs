use serde::{Deserialize, Serialize};

/// Core object custom-version value supplied by the enclosing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreObjectVersion(pub i32);

impl CoreObjectVersion {
	/// Before the custom version was introduced.
	pub const BEFORE_CUSTOM_VERSION: Self = Self(0);
	/// Struct definitions started serializing their field properties inline.
	pub const FPROPERTIES: Self = Self(4);
}

/// Read-only view of the format revision used for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionGate {
	/// Core object custom version of the enclosing container.
	pub core_object_version: CoreObjectVersion,
}

impl VersionGate {
	/// Gate for a container at the given core object version.
	pub fn new(core_object_version: CoreObjectVersion) -> Self {
		Self { core_object_version }
	}

	/// Gate with inline properties enabled, the layout current writers produce.
	pub fn with_inline_properties() -> Self {
		Self::new(CoreObjectVersion::FPROPERTIES)
	}

	/// Whether struct records carry an inline property list.
	pub fn has_inline_properties(self) -> bool {
		self.core_object_version >= CoreObjectVersion::FPROPERTIES
	}
}

#[cfg(test)]
mod tests {
	use super::{CoreObjectVersion, VersionGate};

	#[test]
	fn inline_properties_start_at_fproperties() {
		assert!(!VersionGate::default().has_inline_properties());
		assert!(!VersionGate::new(CoreObjectVersion(3)).has_inline_properties());
		assert!(VersionGate::new(CoreObjectVersion::FPROPERTIES).has_inline_properties());
		assert!(VersionGate::new(CoreObjectVersion(10)).has_inline_properties());
		assert!(VersionGate::with_inline_properties().has_inline_properties());
	}
}

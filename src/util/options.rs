use crate::util::constants::*;
use std::default::Default;
use strum_macros::{Display, EnumString};

/// The collection strategies this crate can build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumString, Display)]
pub enum PlanSelector {
    /// Copying nursery, mark-sweep mature space.
    GenCopyMS,
    /// Full-heap copying between two semispaces.
    SemiSpace,
}

/// The default heap size.
pub const DEFAULT_HEAP_SIZE: usize = 64 << LOG_BYTES_IN_MBYTE;
/// The default nursery extent.
pub const DEFAULT_NURSERY_SIZE: usize = 16 << LOG_BYTES_IN_MBYTE;
/// The default nursery trigger. A nursery holding more than this many bytes forces a collection.
pub const DEFAULT_MAX_NURSERY: usize = 8 << LOG_BYTES_IN_MBYTE;
/// The default immortal space extent.
pub const DEFAULT_IMMORTAL_SIZE: usize = 4 << LOG_BYTES_IN_MBYTE;

fn always_valid<T>(_: &T) -> bool {
    true
}

macro_rules! options {
    ($($name:ident: $type:ty[$validator:expr] = $default:expr),*,) => [
        options!($($name: $type[$validator] = $default),*);
    ];
    ($($name:ident: $type:ty[$validator:expr] = $default:expr),*) => [
        #[derive(Clone, Debug)]
        pub struct Options {
            $(pub $name: $type),*
        }
        impl Options {
            /// Set an option by its snake case name. Returns false if the name is unknown,
            /// the value does not parse, or the validator rejects it. The old value is kept
            /// in all of those cases.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> bool {
                match s {
                    $(stringify!($name) => if let Ok(ref val) = val.parse::<$type>() {
                        let validate_fn = $validator;
                        let is_valid = validate_fn(val);
                        if is_valid {
                            self.$name = val.clone();
                        } else {
                            warn!("Unable to set {}={:?}. Invalid value. Default value will be used.", s, val);
                        }
                        is_valid
                    } else {
                        warn!("Unable to set {}={:?}. Cannot parse value. Default value will be used.", s, val);
                        false
                    })*
                    _ => {
                        warn!("Unknown option {}", s);
                        false
                    }
                }
            }

            /// Options with their defaults, without looking at the environment.
            pub fn new_defaults() -> Self {
                Options {
                    $($name: $default),*
                }
            }

            /// Read `MMTK_<NAME>` environment variables and apply the ones that match an option.
            pub fn read_env_var_settings(&mut self) {
                const PREFIX: &str = "MMTK_";
                for (key, val) in std::env::vars() {
                    if let Some(rest_of_key) = key.strip_prefix(PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => { self.set_from_str(lowercase, &val); },)*
                            _ => {}
                        }
                    }
                }
            }
        }
        impl Default for Options {
            fn default() -> Self {
                let mut options = Self::new_defaults();
                options.read_env_var_settings();
                options
            }
        }
    ]
}

options! {
    // The plan to use.
    plan:                    PlanSelector [always_valid] = PlanSelector::GenCopyMS,
    // Heap size in bytes. Page usage above this triggers a collection.
    heap_size:               usize [|v: &usize| *v >= BYTES_IN_CHUNK] = DEFAULT_HEAP_SIZE,
    // Number of collector threads.
    threads:                 usize [|v: &usize| *v > 0] = num_cpus::get(),
    // Bytes reserved for the nursery extent.
    nursery_size:            usize [|v: &usize| *v >= BYTES_IN_PAGE] = DEFAULT_NURSERY_SIZE,
    // A nursery that has reserved more than this many bytes triggers a collection.
    max_nursery:             usize [|v: &usize| *v >= BYTES_IN_PAGE] = DEFAULT_MAX_NURSERY,
    // Bytes reserved for the immortal space extent.
    immortal_size:           usize [|v: &usize| *v >= BYTES_IN_PAGE] = DEFAULT_IMMORTAL_SIZE,
    // How many bytes a bump allocator claims from its space when its local chunk runs out.
    bump_chunk_size:         usize [|v: &usize| *v >= MIN_OBJECT_SIZE && v.is_power_of_two()] = DEFAULT_BUMP_CHUNK_SIZE,
    // How many collections to attempt for a single allocation before reporting out of memory.
    max_collection_attempts: usize [|v: &usize| *v > 0] = DEFAULT_MAX_COLLECTION_ATTEMPTS,
    // Should a user requested collection collect the full heap?
    full_heap_system_gc:     bool [always_valid] = false,
    // Should we ignore collections requested by the user?
    ignore_system_gc:        bool [always_valid] = false,
}

impl Options {
    /// The nursery trigger in pages.
    pub fn max_nursery_pages(&self) -> usize {
        crate::util::conversions::bytes_to_pages_up(self.max_nursery)
    }
}

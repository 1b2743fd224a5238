//! Type context over a single rank profile.
//!
//! [`ProfileTypeContext`] answers reference lookups from the schema, the
//! query profiles and the profile itself, and memoizes function types for the
//! duration of one resolution pass.

use std::cell::RefCell;
use std::collections::HashMap;

use rankexpr_ir::{ExpressionFunction, FunctionTypeKey, TensorType, TypeContext};

use crate::profile::{QueryProfileRegistry, RankProfile, Schema};

pub struct ProfileTypeContext<'a> {
    schema: &'a Schema,
    query_profiles: &'a QueryProfileRegistry,
    profile: &'a RankProfile,
    cache: RefCell<HashMap<FunctionTypeKey, TensorType>>,
}

impl<'a> ProfileTypeContext<'a> {
    pub fn new(
        schema: &'a Schema,
        query_profiles: &'a QueryProfileRegistry,
        profile: &'a RankProfile,
    ) -> Self {
        ProfileTypeContext {
            schema,
            query_profiles,
            profile,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn profile(&self) -> &RankProfile {
        self.profile
    }

    /// Number of function types memoized so far.
    pub fn cached_types(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl TypeContext for ProfileTypeContext<'_> {
    fn attribute_type(&self, name: &str) -> Option<&TensorType> {
        self.schema.attribute(name)
    }

    fn query_type(&self, name: &str) -> Option<&TensorType> {
        self.query_profiles.parameter(name)
    }

    /// Profile constants shadow schema constants.
    fn constant_type(&self, name: &str) -> Option<&TensorType> {
        self.profile
            .constant(name)
            .or_else(|| self.schema.constant(name))
    }

    fn function(&self, name: &str) -> Option<&ExpressionFunction> {
        self.profile.function(name)
    }

    fn cached_function_type(&self, key: &FunctionTypeKey) -> Option<TensorType> {
        if let Some(cached) = self.cache.borrow().get(key) {
            return Some(cached.clone());
        }
        if key.argument_types.is_empty() {
            return self.profile.inferred_return_type(&key.function).cloned();
        }
        None
    }

    fn cache_function_type(&self, key: FunctionTypeKey, tensor_type: TensorType) {
        self.cache.borrow_mut().insert(key, tensor_type);
    }
}

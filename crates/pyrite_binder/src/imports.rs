//! Import binding.
//!
//! Models what the runtime module loader would do for each import form:
//! `import a.b.c` binds `a` and records nested loader actions for `b`
//! and `c`; aliased and from-imports bind the terminal module or symbol
//! directly; wildcard imports consult the host's symbol-table lookup.

use crate::binder::{Binder, BinderFault, BindResult};
use crate::declaration::{Declaration, LoaderActions};
use indexmap::IndexMap;
use pyrite_ast::node::{
    ImportAsNode, ImportFromNode, ImportInfo, ImportNode, ImportType, ModuleNameNode,
};
use pyrite_core::names::Name;
use pyrite_diagnostics::{format_message, messages, rules, DiagnosticAction};

impl<'a> Binder<'a> {
    pub(crate) fn visit_import(&mut self, node: &'a ImportNode<'a>) -> BindResult {
        for import in node.imports {
            self.visit_import_as(import)?;
        }
        Ok(())
    }

    /// Validate a module-name node and report unresolved-import and
    /// missing-stub diagnostics. Missing import info is a structural
    /// fault: the parser attaches it for every module name.
    pub(crate) fn check_module_name(
        &mut self,
        node: &'a ModuleNameNode<'a>,
    ) -> BindResult<&'a ImportInfo> {
        let info = node.import_info.as_ref().ok_or_else(|| {
            BinderFault::new("module name node has no attached import info", node.data.id)
        })?;

        if !info.is_import_found {
            let message = format_message(messages::IMPORT_RESOLVE_FAILURE, &[&info.import_name]);
            self.diagnostics.add_with_level(
                self.file.rule_set.report_missing_imports,
                rules::REPORT_MISSING_IMPORTS,
                message,
                node.data.range,
            );
        } else if info.import_type == ImportType::ThirdParty && !info.is_stub_file {
            let message = format_message(messages::STUB_FILE_MISSING, &[&info.import_name]);
            if let Some(diagnostic) = self.diagnostics.add_with_level(
                self.file.rule_set.report_missing_type_stubs,
                rules::REPORT_MISSING_TYPE_STUBS,
                message,
                node.data.range,
            ) {
                diagnostic.action = Some(DiagnosticAction::CreateTypeStub {
                    module_name: info.import_name.clone(),
                });
            }
        }
        Ok(info)
    }

    fn visit_import_as(&mut self, node: &'a ImportAsNode<'a>) -> BindResult {
        let info = self.check_module_name(node.module)?;
        let first = node
            .module
            .name_parts
            .first()
            .copied()
            .ok_or_else(|| BinderFault::new("import statement with empty module name", node.data.id))?;
        if self.unexecuted {
            return Ok(());
        }

        let bound_name = node.alias.map(|alias| alias.value).unwrap_or(first.value);
        let Some(symbol_id) = self.bind_name_to_scope(bound_name) else {
            return Ok(());
        };

        let first_part = first.value;
        let aliased_or_single = node.alias.is_some() || node.module.name_parts.len() == 1;
        let terminal_path = info.resolved_paths.last().cloned().unwrap_or_default();
        let root_path = info.resolved_paths.first().cloned().unwrap_or_default();
        let parts: Vec<Name> =
            node.module.name_parts.iter().map(|part| part.value).collect();
        // The imported module's own implicit submodules, merged into the
        // alias declaration for aliased and single-part imports.
        let implicit: Vec<(Name, String)> = info
            .implicit_imports
            .iter()
            .map(|ii| (self.interner.intern(&ii.name), ii.path.clone()))
            .collect();
        let range = node.data.range;

        // Repeated imports of the same root name merge into a single
        // alias declaration rather than appending a new one.
        let symbol = self.symbols.get_mut(symbol_id);
        let index = match symbol.declarations().iter().position(|declaration| {
            matches!(
                declaration,
                Declaration::Alias { first_name_part: Some(existing), .. } if *existing == first_part
            )
        }) {
            Some(existing) => existing,
            None => {
                symbol.add_declaration(Declaration::Alias {
                    path: if aliased_or_single {
                        terminal_path.clone()
                    } else {
                        root_path
                    },
                    range,
                    first_name_part: Some(first_part),
                    symbol_name: None,
                    implicit_imports: IndexMap::default(),
                });
                symbol.declarations().len() - 1
            }
        };
        let Some(Declaration::Alias {
            path,
            implicit_imports,
            ..
        }) = symbol.declarations_mut().get_mut(index)
        else {
            return Err(BinderFault::new(
                "alias declaration lookup returned a non-alias declaration",
                node.data.id,
            ));
        };

        if aliased_or_single {
            *path = terminal_path;
            for (name, implicit_path) in implicit {
                implicit_imports
                    .entry(name)
                    .or_insert_with(|| LoaderActions::with_path(implicit_path));
            }
        } else {
            // Build or extend the loader-action chain for each dotted
            // part past the first, setting the resolved path on the
            // terminal part.
            let last = parts.len() - 1;
            let mut current = implicit_imports;
            for (i, part) in parts.iter().enumerate().skip(1) {
                let actions = current.entry(*part).or_default();
                if i == last {
                    actions.path = info.resolved_paths.get(i).cloned().unwrap_or_default();
                }
                current = &mut actions.implicit_imports;
            }
        }
        Ok(())
    }

    pub(crate) fn visit_import_from(&mut self, node: &'a ImportFromNode<'a>) -> BindResult {
        let info = self.check_module_name(node.module)?;
        if self.unexecuted {
            return Ok(());
        }
        let module_path = info.resolved_paths.last().cloned().unwrap_or_default();

        if node.is_wildcard {
            // Every name the target module exports binds locally, then
            // every implicit submodule.
            if let Some(lookup) = self.file.import_lookup {
                if let Some(exports) = lookup.lookup(&module_path) {
                    for name in &exports.symbol_names {
                        let interned = self.interner.intern(name);
                        if let Some(symbol) = self.bind_name_to_scope(interned) {
                            self.symbols.get_mut(symbol).add_declaration(Declaration::Alias {
                                path: module_path.clone(),
                                range: node.data.range,
                                first_name_part: None,
                                symbol_name: Some(interned),
                                implicit_imports: IndexMap::default(),
                            });
                        }
                    }
                }
            }
            for implicit in &info.implicit_imports {
                let interned = self.interner.intern(&implicit.name);
                if let Some(symbol) = self.bind_name_to_scope(interned) {
                    self.symbols.get_mut(symbol).add_declaration(Declaration::Alias {
                        path: implicit.path.clone(),
                        range: node.data.range,
                        first_name_part: None,
                        symbol_name: None,
                        implicit_imports: IndexMap::default(),
                    });
                }
            }
            return Ok(());
        }

        for import in node.imports {
            let imported = import.name.value;
            let bound = import.alias.unwrap_or(import.name).value;
            // A from-import of an implicit submodule binds the submodule
            // itself rather than a symbol within the module.
            let implicit_path = info
                .implicit_imports
                .iter()
                .find(|ii| self.interner.text(imported) == ii.name)
                .map(|ii| ii.path.clone());
            if let Some(symbol) = self.bind_name_to_scope(bound) {
                let declaration = match implicit_path {
                    Some(path) => Declaration::Alias {
                        path,
                        range: import.data.range,
                        first_name_part: None,
                        symbol_name: None,
                        implicit_imports: IndexMap::default(),
                    },
                    None => Declaration::Alias {
                        path: module_path.clone(),
                        range: import.data.range,
                        first_name_part: None,
                        symbol_name: Some(imported),
                        implicit_imports: IndexMap::default(),
                    },
                };
                self.symbols.get_mut(symbol).add_declaration(declaration);
            }
        }
        Ok(())
    }
}

//! Structural optimization of a layer hierarchy into node plans.
//!
//! Planning is a pure pass over the document. [`super::BlendTree`] then materializes the plan into
//! its arena and hands out buffers.

use crate::blend::mode::BlendMode;
use crate::document::layer::{ImageLayer, Layer, LayerGroup, LayerId};
use crate::foundation::math::combine_percent;
use crate::tree::node::NodeSource;

/// A node-to-be.
#[derive(Debug)]
pub(crate) struct Plan {
    pub(crate) source: NodeSource,
    pub(crate) alpha: u8,
    pub(crate) blend_mode: BlendMode,
    pub(crate) mask: Option<LayerId>,
    pub(crate) clip: bool,
    pub(crate) folded: bool,
    pub(crate) children: Vec<Plan>,
    /// Eliminated groups whose invalidations land on this node.
    pub(crate) aliases: Vec<LayerId>,
}

impl Plan {
    fn group(id: Option<LayerId>, alpha: u8, blend_mode: BlendMode, children: Vec<Plan>) -> Self {
        Self {
            source: NodeSource::Group(id),
            alpha,
            blend_mode,
            mask: None,
            clip: false,
            folded: false,
            children,
            aliases: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self.source, NodeSource::Layer(_))
    }

    /// Absorb an eliminated single-child group.
    fn fold_into(
        mut self,
        group: Option<LayerId>,
        alpha: u8,
        blend_mode: BlendMode,
        mask: Option<LayerId>,
        aliases: Vec<LayerId>,
    ) -> Self {
        self.alpha = combine_percent(alpha, self.alpha);
        if !blend_mode.is_passthrough() {
            self.blend_mode = blend_mode;
        }
        if self.mask.is_none() {
            self.mask = mask;
        }
        self.folded = true;
        self.aliases.extend(group);
        self.aliases.extend(aliases);
        self
    }
}

enum Planned {
    Pruned,
    Node(Plan),
    /// Passthrough group at full opacity without a mask: its children join the parent.
    Splice {
        group: LayerId,
        children: Vec<Plan>,
        aliases: Vec<LayerId>,
    },
}

/// Plan the whole tree. The root group always composites as normal at full opacity.
pub(crate) fn plan_root(root: &LayerGroup, require_simple_fusion: bool) -> Plan {
    let (children, aliases) = plan_children(&root.children);
    let mut plan = Plan::group(Some(root.id), 100, BlendMode::Normal, children);
    plan.aliases = aliases;

    if plan.children.len() == 1 {
        let child = &plan.children[0];
        let simple = !child.is_leaf() && child.alpha == 100 && child.mask.is_none();
        if simple || !require_simple_fusion {
            let Plan {
                source,
                mut children,
                aliases,
                ..
            } = plan;
            let group = match source {
                NodeSource::Group(id) => id,
                NodeSource::Layer(_) => None,
            };
            if let Some(child) = children.pop() {
                return child.fold_into(group, 100, BlendMode::Normal, None, aliases);
            }
            return Plan::group(group, 100, BlendMode::Normal, Vec::new());
        }
    }
    plan
}

fn plan_layer(layer: &Layer) -> Planned {
    match layer {
        Layer::Image(l) => plan_image(l),
        Layer::Group(g) => plan_group(g),
    }
}

fn plan_image(layer: &ImageLayer) -> Planned {
    if !layer.visible || layer.alpha == 0 {
        return Planned::Pruned;
    }
    let blend_mode = if layer.blend_mode.is_passthrough() {
        BlendMode::Normal
    } else {
        layer.blend_mode
    };
    Planned::Node(Plan {
        source: NodeSource::Layer(layer.id),
        alpha: layer.alpha.min(100),
        blend_mode,
        mask: layer.mask.as_ref().map(|_| layer.id),
        clip: false,
        folded: false,
        children: Vec::new(),
        aliases: Vec::new(),
    })
}

fn plan_group(group: &LayerGroup) -> Planned {
    if !group.visible || group.alpha == 0 {
        return Planned::Pruned;
    }
    let (mut children, aliases) = plan_children(&group.children);
    if children.is_empty() {
        return Planned::Pruned;
    }

    let alpha = group.alpha.min(100);
    let mask = group.mask.as_ref().map(|_| group.id);
    if group.blend_mode.is_passthrough() && alpha == 100 && mask.is_none() {
        return Planned::Splice {
            group: group.id,
            children,
            aliases,
        };
    }

    if children.len() == 1
        && !(mask.is_some() && children[0].mask.is_some())
        && let Some(child) = children.pop()
    {
        return Planned::Node(child.fold_into(
            Some(group.id),
            alpha,
            group.blend_mode,
            mask,
            aliases,
        ));
    }

    let mut plan = Plan::group(Some(group.id), alpha, group.blend_mode, children);
    plan.mask = mask;
    plan.aliases = aliases;
    Planned::Node(plan)
}

fn push_planned(planned: Planned, out: &mut Vec<Plan>, aliases: &mut Vec<LayerId>) {
    match planned {
        Planned::Pruned => {}
        Planned::Node(plan) => out.push(plan),
        Planned::Splice {
            group,
            children,
            aliases: spliced,
        } => {
            out.extend(children);
            aliases.push(group);
            aliases.extend(spliced);
        }
    }
}

/// Plan a sibling list, grouping each clipping run with its base.
fn plan_children(layers: &[Layer]) -> (Vec<Plan>, Vec<LayerId>) {
    let mut out = Vec::new();
    let mut aliases = Vec::new();
    let mut i = 0;
    while i < layers.len() {
        // A clipping layer with nothing below it acts as an ordinary base.
        let base = &layers[i];
        i += 1;
        let run_start = i;
        while i < layers.len() && layers[i].clip() {
            i += 1;
        }
        let run = &layers[run_start..i];

        let planned = plan_layer(base);
        if run.is_empty() {
            push_planned(planned, &mut out, &mut aliases);
            continue;
        }

        let base_plan = match planned {
            // Clipping layers over a hidden base are hidden too.
            Planned::Pruned => continue,
            Planned::Node(plan) => plan,
            Planned::Splice {
                group,
                children,
                aliases: spliced,
            } => {
                let mut plan = Plan::group(Some(group), 100, BlendMode::Normal, children);
                plan.aliases = spliced;
                plan
            }
        };

        let mut clip_children = Vec::new();
        let mut clip_aliases = Vec::new();
        for layer in run {
            push_planned(plan_layer(layer), &mut clip_children, &mut clip_aliases);
        }
        if clip_children.is_empty() {
            out.push(base_plan);
            continue;
        }

        let blend_mode = if base_plan.blend_mode.is_passthrough() {
            BlendMode::Normal
        } else {
            base_plan.blend_mode
        };
        let mut children = Vec::with_capacity(1 + clip_children.len());
        children.push(base_plan);
        children.extend(clip_children);
        let mut clip_group = Plan::group(None, 100, blend_mode, children);
        clip_group.clip = true;
        clip_group.aliases = clip_aliases;
        out.push(clip_group);
    }
    (out, aliases)
}

#[cfg(test)]
#[path = "../../tests/unit/tree/build.rs"]
mod tests;

//! `NN.params`: layer sizes, activation, keep probabilities, weights and biases.

use crate::io::fmt::{general, sci};
use crate::model::precision::Precision;
use crate::network::{Activation, Groups};
use std::fmt::{self, Write};

fn rule(out: &mut String) {
    out.push('#');
    out.push_str(&"=".repeat(80));
    out.push('\n');
}

fn value(v: f64, precision: Precision) -> String {
    match precision {
        Precision::Double => sci(v, 23, 15),
        Precision::Single => sci(precision.round(v), 15, 7),
    }
}

pub(super) fn render(
    groups: &Groups<'_>,
    activation: Activation,
    precision: Precision,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    rule(&mut out);
    out.push_str(
        "# NN structure and parameters file generated by ann-forge\n\
         #\n\
         # Note that the NN assumes each row of the input \"X\" is an\n\
         # observation, i.e. the layer is implemented as\n\
         # Y = activation(XW + b).\n\
         # You need to transpose your weight matrix if each column of \"X\" is\n\
         # an observation.\n",
    );
    rule(&mut out);
    out.push('\n');

    let linears: Vec<_> = groups.linears().collect();
    let num_layers = linears.len();
    writeln!(
        out,
        "{num_layers}    # number of layers (excluding input layer,including output layer)"
    )?;
    for linear in &linears {
        write!(out, "{}  ", linear.outputs())?;
    }
    out.push_str("  # size of each layer (last must be 1)\n");
    writeln!(out, "{activation}    # activation function")?;
    for keep in groups.keep_probabilities() {
        write!(out, "{}  ", general(keep, 15))?;
    }
    out.push_str("  # keep probability of input for each layer\n\n");

    for (i, linear) in linears.iter().enumerate() {
        let (rows, cols) = (linear.inputs(), linear.outputs());
        let is_output = i + 1 == num_layers;
        if is_output {
            writeln!(out, "# weight of output layer, shape({rows}, {cols})")?;
        } else {
            writeln!(out, "# weight of hidden layer {},  shape({rows}, {cols})", i + 1)?;
        }
        for row in linear.weight.t().rows() {
            for &v in row {
                out.push_str(&value(v, precision));
            }
            out.push('\n');
        }

        if is_output {
            writeln!(out, "# bias of output layer, shape({cols}, )")?;
        } else {
            writeln!(out, "# bias of hidden layer {}, shape({cols}, )", i + 1)?;
        }
        for &v in &linear.bias {
            out.push_str(&value(v, precision));
        }
        out.push_str("\n\n");
    }
    Ok(out)
}

use burn::{
    nn::{
        attention::{
            generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig,
        },
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub vocab_size:         usize,
    pub max_seq_len:        usize,
    pub d_model:            usize,
    pub num_heads:          usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub d_ff:               usize,
    pub dropout:            f64,
    /// Token id used for padding and as the decoder start token
    #[config(default = 0)]
    pub pad_id:             usize,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        // One embedding table shared between encoder and decoder —
        // both sides read the same vocabulary.
        let token_embedding       = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let encoder_pos_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let decoder_pos_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);

        let encoder_layers: Vec<EncoderBlock<B>> = (0..self.num_encoder_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let decoder_layers: Vec<DecoderBlock<B>> = (0..self.num_decoder_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();

        let encoder_norm = LayerNormConfig::new(self.d_model).init(device);
        let decoder_norm = LayerNormConfig::new(self.d_model).init(device);
        let lm_head      = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout      = DropoutConfig::new(self.dropout).init();

        Seq2SeqModel {
            token_embedding, encoder_pos_embedding, decoder_pos_embedding,
            encoder_layers, decoder_layers,
            encoder_norm, decoder_norm, lm_head, dropout,
            max_seq_len: self.max_seq_len,
            pad_id:      self.pad_id,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let cross_attn  = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let norm3   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        DecoderBlock { self_attn, cross_attn, ffn_linear1, ffn_linear2, norm1, norm2, norm3, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, src_len, d_model], pad_mask: [batch, src_len] (true = padding)
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_output = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    /// x: [batch, tgt_len, d_model], encoder_out: [batch, src_len, d_model].
    /// The causal mask keeps position t from attending past itself;
    /// the pad mask keeps cross-attention off padded source positions.
    pub fn forward(
        &self,
        x:            Tensor<B, 3>,
        encoder_out:  Tensor<B, 3>,
        causal_mask:  Tensor<B, 3, Bool>,
        src_pad_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let self_out = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(causal_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(self_out));

        let cross_out = self
            .cross_attn
            .forward(
                MhaInput::new(x.clone(), encoder_out.clone(), encoder_out)
                    .mask_pad(src_pad_mask),
            )
            .context;
        let x = self.norm2.forward(x + self.dropout.forward(cross_out));

        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm3.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub token_embedding:       Embedding<B>,
    pub encoder_pos_embedding: Embedding<B>,
    pub decoder_pos_embedding: Embedding<B>,
    pub encoder_layers:        Vec<EncoderBlock<B>>,
    pub decoder_layers:        Vec<DecoderBlock<B>>,
    pub encoder_norm:          LayerNorm<B>,
    pub decoder_norm:          LayerNorm<B>,
    pub lm_head:               Linear<B>,
    pub dropout:               Dropout,
    pub max_seq_len:           usize,
    pub pad_id:                usize,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// Encode framed inputs.
    /// input_ids: [batch, src_len] → [batch, src_len, d_model]
    pub fn encode(
        &self,
        input_ids:    Tensor<B, 2, Int>,
        src_pad_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.encoder_pos_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.encoder_layers {
            x = layer.forward(x, src_pad_mask.clone());
        }
        self.encoder_norm.forward(x)
    }

    /// Decode a target prefix against an encoded source.
    /// decoder_ids: [batch, tgt_len] → logits: [batch, tgt_len, vocab]
    pub fn decode(
        &self,
        decoder_ids:  Tensor<B, 2, Int>,
        encoder_out:  Tensor<B, 3>,
        src_pad_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = decoder_ids.dims();
        let device = encoder_out.device();

        let tok_emb = self.token_embedding.forward(decoder_ids);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.decoder_pos_embedding.forward(positions);

        let causal_mask = generate_autoregressive_mask::<B>(batch_size, seq_len, &device);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.decoder_layers {
            x = layer.forward(x, encoder_out.clone(), causal_mask.clone(), src_pad_mask.clone());
        }
        let x = self.decoder_norm.forward(x);

        self.lm_head.forward(x)
    }

    /// Teacher-forced sequence loss for one batch.
    /// The decoder reads the labels shifted right one position (the
    /// pad id doubles as the start token, as in T5) and the loss is
    /// token-level cross-entropy against the unshifted labels, with
    /// padding positions excluded.
    pub fn forward_training(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [batch_size, seq_len] = labels.dims();

        let src_pad_mask  = attention_mask.equal_elem(0);
        let encoder_out   = self.encode(input_ids, src_pad_mask.clone());
        let decoder_input = self.shift_right(labels.clone());
        let logits        = self.decode(decoder_input, encoder_out, src_pad_mask);

        let [_, _, vocab] = logits.dims();

        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![self.pad_id]))
            .init(&logits.device());

        ce.forward(
            logits.reshape([batch_size * seq_len, vocab]),
            labels.reshape([batch_size * seq_len]),
        )
    }

    /// Prepend the start token and drop the last label so position t
    /// of the decoder input holds the token generated before t.
    fn shift_right(&self, labels: Tensor<B, 2, Int>) -> Tensor<B, 2, Int> {
        let [batch_size, seq_len] = labels.dims();
        let device = labels.device();

        let start = Tensor::<B, 2, Int>::full([batch_size, 1], self.pad_id as i32, &device);
        let body  = labels.slice([0..batch_size, 0..seq_len - 1]);
        Tensor::cat(vec![start, body], 1)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn tiny_config() -> Seq2SeqConfig {
        // vocab 50, seq 8, d_model 16, 2 heads, 1+1 layers, d_ff 32, no dropout
        Seq2SeqConfig::new(50, 8, 16, 2, 1, 1, 32, 0.0)
    }

    #[test]
    fn test_logits_shape() {
        let device = Default::default();
        let model  = tiny_config().init::<NdArray>(&device);

        let input_ids = Tensor::<NdArray, 2, Int>::from_ints(
            [[5, 6, 7, 8, 1, 0, 0, 0], [9, 10, 1, 0, 0, 0, 0, 0]],
            &device,
        );
        let mask = Tensor::<NdArray, 2, Int>::from_ints(
            [[1, 1, 1, 1, 1, 0, 0, 0], [1, 1, 1, 0, 0, 0, 0, 0]],
            &device,
        );

        let src_pad_mask = mask.equal_elem(0);
        let encoded = model.encode(input_ids, src_pad_mask.clone());
        assert_eq!(encoded.dims(), [2, 8, 16]);

        let decoder_ids = Tensor::<NdArray, 2, Int>::from_ints(
            [[0, 11, 12], [0, 13, 14]],
            &device,
        );
        let logits = model.decode(decoder_ids, encoded, src_pad_mask);
        assert_eq!(logits.dims(), [2, 3, 50]);
    }

    #[test]
    fn test_training_loss_is_finite() {
        let device = Default::default();
        let model  = tiny_config().init::<NdArray>(&device);

        let input_ids = Tensor::<NdArray, 2, Int>::from_ints(
            [[5, 6, 7, 8, 1, 0, 0, 0]],
            &device,
        );
        let mask = Tensor::<NdArray, 2, Int>::from_ints(
            [[1, 1, 1, 1, 1, 0, 0, 0]],
            &device,
        );
        let labels = Tensor::<NdArray, 2, Int>::from_ints(
            [[20, 21, 22, 1, 0, 0, 0, 0]],
            &device,
        );

        let loss = model.forward_training(input_ids, mask, labels);
        let value: f64 = loss.into_scalar().elem::<f64>();
        assert!(value.is_finite());
        assert!(value > 0.0);
    }
}
